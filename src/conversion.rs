//! Internal helpers shared by the FFmpeg-facing modules.

use std::path::Path;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

use crate::error::FeatureError;

/// Copy an RGB24 FFmpeg frame into a tightly packed buffer.
///
/// FFmpeg pads rows to an alignment boundary, so `stride(0)` is often larger
/// than `width * 3`. The padding is dropped here so the result can go
/// straight into [`image::RgbImage::from_raw`].
pub(crate) fn rgb_frame_to_buffer(video_frame: &VideoFrame) -> Vec<u8> {
    let width = video_frame.width() as usize;
    let height = video_frame.height() as usize;
    let stride = video_frame.stride(0);
    let row_bytes = width * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * height].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * height);
    for row in data.chunks(stride).take(height) {
        buffer.extend_from_slice(&row[..row_bytes]);
    }
    buffer
}

/// Convert an FFmpeg rational to `f64`, or `None` for a zero denominator or
/// a non-positive value.
pub(crate) fn positive_rate(rate: Rational) -> Option<f64> {
    if rate.denominator() == 0 {
        return None;
    }
    let value = rate.numerator() as f64 / rate.denominator() as f64;
    (value > 0.0).then_some(value)
}

/// Initialise FFmpeg and open `path` as a demuxer input.
///
/// A missing path is reported as [`FeatureError::NotFound`] before FFmpeg
/// is touched.
pub(crate) fn open_input(path: &Path) -> Result<ffmpeg_next::format::context::Input, FeatureError> {
    if !path.is_file() {
        return Err(FeatureError::NotFound {
            path: path.to_path_buf(),
        });
    }

    ffmpeg_next::init().map_err(|error| FeatureError::FileOpen {
        path: path.to_path_buf(),
        reason: format!("FFmpeg initialisation failed: {error}"),
    })?;

    ffmpeg_next::format::input(&path).map_err(|error| FeatureError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}
