//! Deterministic frame sampling.
//!
//! The sampler decodes the best video stream from the first frame to the
//! last and keeps every Nth frame in decode order. Skipped frames are
//! dropped straight after decoding; only kept frames are converted to RGB
//! and copied out of the decoder, so peak memory is bounded by
//! `frame_count / sample_rate` buffers.
//!
//! # Example
//!
//! ```no_run
//! let frames = vidfeatures::sample_frames("input.mp4", 10)?;
//! for frame in &frames {
//!     println!("kept source frame {}", frame.source_index());
//! }
//! # Ok::<(), vidfeatures::FeatureError>(())
//! ```

use std::path::Path;

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::Pixel,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{
    configuration::AnalysisOptions,
    conversion,
    error::FeatureError,
    frame::{Frame, FrameSequence},
    progress::{self, ProgressTracker, Stage},
};

/// Sample every `sample_rate`-th frame of the video at `path`.
///
/// Frame `i` of the result was decoded from source frame `i * sample_rate`;
/// a stream of `F` frames yields `ceil(F / sample_rate)` frames.
///
/// # Errors
///
/// - [`FeatureError::InvalidSampleRate`] if `sample_rate` is zero.
/// - [`FeatureError::NotFound`] / [`FeatureError::FileOpen`] /
///   [`FeatureError::NoVideoStream`] if the input cannot be opened.
/// - [`FeatureError::EmptyResult`] if no frame could be decoded.
/// - [`FeatureError::VideoDecodeError`] if the decoder fails mid-stream.
pub fn sample_frames<P: AsRef<Path>>(
    path: P,
    sample_rate: u64,
) -> Result<FrameSequence, FeatureError> {
    let options = AnalysisOptions::new().with_sample_rate(sample_rate);
    sample_frames_with_options(path, &options)
}

/// Like [`sample_frames`], taking the stride, progress callback and
/// cancellation token from `options`.
///
/// Cancellation is checked before every packet read; the decoder and
/// demuxer are released on every exit path.
pub fn sample_frames_with_options<P: AsRef<Path>>(
    path: P,
    options: &AnalysisOptions,
) -> Result<FrameSequence, FeatureError> {
    let path = path.as_ref();
    options.validate()?;
    let sample_rate = options.sample_rate();

    let mut input_context = conversion::open_input(path)?;

    let (stream_index, decoder, reported_frames) = {
        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| FeatureError::NoVideoStream {
                path: path.to_path_buf(),
            })?;
        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| FeatureError::FileOpen {
                path: path.to_path_buf(),
                reason: format!("cannot build video decoder: {error}"),
            })?;
        (stream.index(), decoder, stream.frames())
    };

    log::debug!(
        "Sampling {} (stream={}, sample_rate={})",
        path.display(),
        stream_index,
        sample_rate,
    );

    let expected = (reported_frames > 0).then(|| (reported_frames as u64).div_ceil(sample_rate));
    let mut state = SamplingState {
        decoder,
        scaler: None,
        decoded: VideoFrame::empty(),
        converted: VideoFrame::empty(),
        sample_rate,
        next_index: 0,
        // nb_frames is an untrusted header value: progress total only.
        frames: Vec::new(),
        tracker: ProgressTracker::new(options.progress.clone(), Stage::Sampling, expected),
    };
    let mut rejected_packets = 0_u64;

    loop {
        progress::check_cancelled(options.cancellation())?;

        let mut packet = Packet::empty();
        match packet.read(&mut input_context) {
            Ok(()) => {
                if packet.stream() != stream_index {
                    continue;
                }
                match state.decoder.send_packet(&packet) {
                    Ok(()) => state.drain()?,
                    Err(FfmpegError::InvalidData) => {
                        rejected_packets += 1;
                        log::warn!(
                            "Skipping corrupt packet in {} after frame {}",
                            path.display(),
                            state.next_index,
                        );
                    }
                    Err(error) => return Err(FeatureError::VideoDecodeError(error.to_string())),
                }
            }
            Err(FfmpegError::Eof) => break,
            Err(error) => {
                // Retrying a failing read can spin forever on a truncated
                // file; treat it as the end of the stream.
                log::warn!("Stopping read of {} early: {error}", path.display());
                break;
            }
        }
    }

    state
        .decoder
        .send_eof()
        .map_err(|error| FeatureError::VideoDecodeError(error.to_string()))?;
    state.drain()?;

    log::info!(
        "Sampled {} of {} decoded frames from {} ({} corrupt packets skipped)",
        state.frames.len(),
        state.next_index,
        path.display(),
        rejected_packets,
    );

    FrameSequence::new(path, state.frames, sample_rate)
}

struct SamplingState {
    decoder: VideoDecoder,
    scaler: Option<ScalingContext>,
    decoded: VideoFrame,
    converted: VideoFrame,
    sample_rate: u64,
    /// Decode-order index of the next frame the decoder yields.
    next_index: u64,
    frames: Vec<Frame>,
    tracker: ProgressTracker,
}

impl SamplingState {
    /// Pull every frame the decoder has ready, keeping the sampled ones.
    fn drain(&mut self) -> Result<(), FeatureError> {
        while self.decoder.receive_frame(&mut self.decoded).is_ok() {
            let index = self.next_index;
            self.next_index += 1;

            if index % self.sample_rate != 0 {
                continue;
            }

            let image = self.copy_current_frame()?;
            self.frames.push(Frame::new(index, image));
            self.tracker.advance(1, Some(index));
        }
        Ok(())
    }

    /// Convert the decoded frame to RGB24 and copy it into an owned image.
    fn copy_current_frame(&mut self) -> Result<RgbImage, FeatureError> {
        let format = self.decoded.format();
        let width = self.decoded.width();
        let height = self.decoded.height();

        // Some decoders only settle on their output format after the first
        // frame, and streams may change resolution mid-way.
        let stale = self.scaler.as_ref().is_none_or(|scaler| {
            let input = scaler.input();
            input.format != format || input.width != width || input.height != height
        });
        if stale {
            self.scaler = Some(ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?);
            self.converted = VideoFrame::empty();
        }

        let Some(scaler) = self.scaler.as_mut() else {
            return Err(FeatureError::VideoDecodeError(
                "RGB scaler was not initialised".to_string(),
            ));
        };
        scaler
            .run(&self.decoded, &mut self.converted)
            .map_err(|error| FeatureError::VideoDecodeError(error.to_string()))?;

        let buffer = conversion::rgb_frame_to_buffer(&self.converted);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            FeatureError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }
}
