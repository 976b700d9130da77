//! Owned frame buffers and the sampled frame sequence.

use std::ops::Deref;
use std::path::Path;

use image::RgbImage;

use crate::error::FeatureError;

/// A decoded video frame, copied out of the decoder.
///
/// Pixels are 8-bit RGB. The buffer is owned outright, so it stays valid after
/// the decoder moves on to the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    source_index: u64,
    image: RgbImage,
}

impl Frame {
    /// Wrap an RGB image decoded from source frame `source_index`.
    pub fn new(source_index: u64, image: RgbImage) -> Self {
        Self {
            source_index,
            image,
        }
    }

    /// Decode-order index of this frame in the source stream.
    pub fn source_index(&self) -> u64 {
        self.source_index
    }

    /// Pixel buffer.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the frame, returning the pixel buffer.
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Frames kept by the sampler, in temporal order.
///
/// Never empty: [`FrameSequence::new`] rejects an empty vector. Element `i`
/// was decoded from source frame `i * sample_rate`.
///
/// Derefs to `[Frame]`, so slices of it feed
/// [`detect_cuts`](crate::detect_cuts) and the collaborator analyses
/// directly.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    sample_rate: u64,
}

impl FrameSequence {
    /// Build a sequence from sampled frames.
    ///
    /// # Errors
    ///
    /// [`FeatureError::EmptyResult`] naming `path` if `frames` is empty.
    pub fn new(
        path: &Path,
        frames: Vec<Frame>,
        sample_rate: u64,
    ) -> Result<Self, FeatureError> {
        if frames.is_empty() {
            return Err(FeatureError::EmptyResult {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            frames,
            sample_rate,
        })
    }

    /// Stride the frames were sampled at.
    pub fn sample_rate(&self) -> u64 {
        self.sample_rate
    }

    /// Frames as a slice.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Consume the sequence, returning the frames.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl Deref for FrameSequence {
    type Target = [Frame];

    fn deref(&self) -> &[Frame] {
        &self.frames
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
