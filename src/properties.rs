//! Video property reading.
//!
//! [`open_properties`] opens a container, reads the best video stream's
//! dimensions, frame rate and frame count from metadata, and closes the
//! demuxer before returning. No frame payloads are decoded.

use std::path::Path;

use ffmpeg_next::{codec::context::Context as CodecContext, media::Type};
use serde::Serialize;

use crate::{conversion, error::FeatureError};

/// Intrinsic properties of a video stream.
///
/// Created once per run and never mutated. `duration` is
/// `frame_count / fps`, or `0.0` when the container reports no frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[must_use]
pub struct VideoProperties {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second as reported by the container.
    pub fps: f64,
    /// Total number of frames (reported, or estimated from duration).
    pub frame_count: u64,
    /// Duration in seconds.
    pub duration: f64,
}

impl VideoProperties {
    /// Assemble properties, deriving `duration` from the frame count.
    pub fn new(width: u32, height: u32, fps: f64, frame_count: u64) -> Self {
        let duration = if fps > 0.0 {
            frame_count as f64 / fps
        } else {
            0.0
        };
        Self {
            width,
            height,
            fps,
            frame_count,
            duration,
        }
    }

    /// Expected number of frames kept when sampling every `sample_rate`-th
    /// frame: `ceil(frame_count / sample_rate)`.
    pub fn expected_samples(&self, sample_rate: u64) -> u64 {
        if sample_rate == 0 {
            return 0;
        }
        self.frame_count.div_ceil(sample_rate)
    }
}

/// Read the properties of the best video stream in `path`.
///
/// # Errors
///
/// - [`FeatureError::NotFound`] if `path` is not a file.
/// - [`FeatureError::FileOpen`] if FFmpeg cannot open the container, build a
///   decoder for its video stream, or the stream reports zero dimensions.
/// - [`FeatureError::NoVideoStream`] if the container has no video.
///
/// # Example
///
/// ```no_run
/// let properties = vidfeatures::open_properties("input.mp4")?;
/// println!("{}x{} @ {:.2} fps", properties.width, properties.height, properties.fps);
/// # Ok::<(), vidfeatures::FeatureError>(())
/// ```
pub fn open_properties<P: AsRef<Path>>(path: P) -> Result<VideoProperties, FeatureError> {
    let path = path.as_ref();
    log::debug!("Reading video properties: {}", path.display());

    let input_context = conversion::open_input(path)?;
    let stream = input_context
        .streams()
        .best(Type::Video)
        .ok_or_else(|| FeatureError::NoVideoStream {
            path: path.to_path_buf(),
        })?;

    let open_failure = |reason: String| FeatureError::FileOpen {
        path: path.to_path_buf(),
        reason,
    };

    let decoder = CodecContext::from_parameters(stream.parameters())
        .and_then(|context| context.decoder().video())
        .map_err(|error| open_failure(format!("cannot build video decoder: {error}")))?;

    let (width, height) = (decoder.width(), decoder.height());
    if width == 0 || height == 0 {
        return Err(open_failure(format!(
            "video stream reports invalid dimensions {width}x{height}"
        )));
    }

    let fps = conversion::positive_rate(stream.avg_frame_rate())
        .or_else(|| conversion::positive_rate(stream.rate()))
        .unwrap_or(0.0);

    let frame_count = if stream.frames() > 0 {
        stream.frames() as u64
    } else {
        // Containers such as MKV omit nb_frames; estimate from duration.
        let stream_seconds = stream.duration() as f64 * f64::from(stream.time_base());
        let seconds = if input_context.duration() > 0 {
            // Container duration is in AV_TIME_BASE (microseconds).
            input_context.duration() as f64 / 1_000_000.0
        } else {
            stream_seconds.max(0.0)
        };
        (seconds * fps).round() as u64
    };

    let properties = VideoProperties::new(width, height, fps, frame_count);

    log::info!(
        "Opened {}: {}x{}, {:.2} fps, {} frames, {:.2}s",
        path.display(),
        properties.width,
        properties.height,
        properties.fps,
        properties.frame_count,
        properties.duration,
    );

    Ok(properties)
}
