//! Error types for the `vidfeatures` crate.
//!
//! This module defines [`FeatureError`], the unified error type returned by
//! every fallible operation in the crate. Variants carry the path or the
//! pipeline stage that failed so a run can be diagnosed without re-running
//! it.

use std::{error::Error as StdError, io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use serde_json::Error as JsonError;
use thiserror::Error;

use crate::progress::Stage;

/// Boxed error returned by external collaborators (object detectors, OCR
/// engines).
pub type CollaboratorError = Box<dyn StdError + Send + Sync + 'static>;

/// The unified error type for all `vidfeatures` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FeatureError {
    /// The input path does not resolve to a readable file.
    #[error("Video file not found: {path}")]
    NotFound {
        /// Path that was passed in.
        path: PathBuf,
    },

    /// The container could not be opened or its codec is unsupported.
    #[error("Cannot open video file {path}: {reason}")]
    FileOpen {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying reason reported by FFmpeg.
        reason: String,
    },

    /// The container opened but carries no video stream.
    #[error("No video stream found in {path}")]
    NoVideoStream {
        /// Path of the offending container.
        path: PathBuf,
    },

    /// A sample rate of zero was supplied.
    #[error("Sample rate must be a positive integer (got {0})")]
    InvalidSampleRate(u64),

    /// Sampling finished without retaining a single frame.
    #[error("No frames extracted from {path}")]
    EmptyResult {
        /// Path of the empty or fully unreadable video.
        path: PathBuf,
    },

    /// A frame could not be decoded or converted.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An external detector or OCR engine failed.
    #[error("{stage} collaborator failed: {source}")]
    Collaborator {
        /// Pipeline stage that invoked the collaborator.
        stage: Stage,
        /// Error raised by the collaborator, untouched.
        #[source]
        source: CollaboratorError,
    },

    /// The run was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The report could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] JsonError),
}

impl FeatureError {
    /// Wrap a collaborator failure, recording which stage raised it.
    pub fn collaborator(stage: Stage, source: CollaboratorError) -> Self {
        FeatureError::Collaborator { stage, source }
    }
}

impl From<FfmpegError> for FeatureError {
    fn from(error: FfmpegError) -> Self {
        FeatureError::FfmpegError(error.to_string())
    }
}
