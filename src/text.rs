//! Text-presence analysis.
//!
//! Recognition is delegated to a [`TextRecognizer`]. Each frame yields an
//! explicit [`TextRecognition`]: either the regions found, or a skip with a
//! reason. Skips are tallied in [`TextAnalysis::frames_skipped`] instead of
//! disappearing; a recognizer *error* aborts the run.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::{
    configuration::AnalysisOptions,
    error::{CollaboratorError, FeatureError},
    frame::Frame,
    progress::{self, ProgressTracker, Stage},
};

/// Channel values below this are pushed to black before OCR.
const CONTRAST_LOW: u8 = 50;
/// Channel values above this are pushed to white before OCR.
const CONTRAST_HIGH: u8 = 200;

/// A text region reported by a recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    /// Recognized text.
    pub text: String,
    /// Confidence on a 0 to 100 scale.
    pub confidence: f64,
}

/// Outcome of running OCR on one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum TextRecognition {
    /// The frame was processed; zero or more regions were found.
    Regions(Vec<TextRegion>),
    /// The recognizer declined the frame.
    Skipped {
        /// Why the frame was not processed.
        reason: String,
    },
}

/// An external OCR engine.
pub trait TextRecognizer {
    /// Recognize text in one frame.
    fn recognize(&mut self, image: &RgbImage) -> Result<TextRecognition, CollaboratorError>;
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for &mut R {
    fn recognize(&mut self, image: &RgbImage) -> Result<TextRecognition, CollaboratorError> {
        (**self).recognize(image)
    }
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Box<R> {
    fn recognize(&mut self, image: &RgbImage) -> Result<TextRecognition, CollaboratorError> {
        (**self).recognize(image)
    }
}

/// Per-run text statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextAnalysis {
    /// Frames handed to the recognizer.
    pub frames_analyzed: u64,
    /// Frames with at least one region at or above the confidence floor.
    pub frames_with_text: u64,
    /// Frames the recognizer skipped.
    pub frames_skipped: u64,
    /// `frames_with_text / frames_analyzed`, or 0 for no frames.
    pub text_present_ratio: f64,
}

/// Crush dark and bright channel values to pure black and white.
///
/// Values below 50 become 0 and values above 200 become 255, which sharpens
/// glyph edges on typical overlays.
pub fn stretch_contrast(image: &RgbImage) -> RgbImage {
    let mut output = image.clone();
    for channel in output.iter_mut() {
        *channel = match *channel {
            value if value < CONTRAST_LOW => 0,
            value if value > CONTRAST_HIGH => 255,
            value => value,
        };
    }
    output
}

/// Run `recognizer` on every frame and compute the text-present ratio.
///
/// The confidence floor (inclusive), optional contrast stretching, progress
/// and cancellation come from `options`.
///
/// # Errors
///
/// [`FeatureError::Collaborator`] if the recognizer fails on any frame;
/// [`FeatureError::Cancelled`] if cancellation fires between frames.
pub fn analyze_text<R: TextRecognizer + ?Sized>(
    recognizer: &mut R,
    frames: &[Frame],
    options: &AnalysisOptions,
) -> Result<TextAnalysis, FeatureError> {
    let min_confidence = options.ocr_min_confidence;
    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        Stage::TextRecognition,
        Some(frames.len() as u64),
    );

    let mut frames_with_text = 0_u64;
    let mut frames_skipped = 0_u64;

    for frame in frames {
        progress::check_cancelled(options.cancellation())?;

        let outcome = if options.ocr_preprocess {
            recognizer.recognize(&stretch_contrast(frame.image()))
        } else {
            recognizer.recognize(frame.image())
        }
        .map_err(|source| FeatureError::collaborator(Stage::TextRecognition, source))?;

        match outcome {
            TextRecognition::Regions(regions) => {
                if regions.iter().any(|region| region.confidence >= min_confidence) {
                    frames_with_text += 1;
                }
            }
            TextRecognition::Skipped { reason } => {
                frames_skipped += 1;
                log::warn!("OCR skipped source frame {}: {reason}", frame.source_index());
            }
        }

        tracker.advance(1, Some(frame.source_index()));
    }

    let frames_analyzed = frames.len() as u64;
    let text_present_ratio = if frames_analyzed > 0 {
        frames_with_text as f64 / frames_analyzed as f64
    } else {
        0.0
    };

    Ok(TextAnalysis {
        frames_analyzed,
        frames_with_text,
        frames_skipped,
        text_present_ratio,
    })
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::stretch_contrast;

    #[test]
    fn contrast_stretch_clamps_extremes_only() {
        let image = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([10, 49, 50]),
            1 => Rgb([120, 200, 201]),
            _ => Rgb([0, 255, 128]),
        });
        let stretched = stretch_contrast(&image);
        assert_eq!(stretched.get_pixel(0, 0), &Rgb([0, 0, 50]));
        assert_eq!(stretched.get_pixel(1, 0), &Rgb([120, 200, 255]));
        assert_eq!(stretched.get_pixel(2, 0), &Rgb([0, 255, 128]));
    }
}
