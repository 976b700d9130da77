//! # vidfeatures
//!
//! Extract descriptive features from video files: deterministically sampled
//! frames, hard-cut counts, and aggregate text/object signals, assembled into
//! a JSON-serializable [`FeatureReport`]. Decoding is powered by FFmpeg via
//! the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Count hard cuts
//!
//! ```no_run
//! let frames = vidfeatures::sample_frames("input.mp4", 10)?;
//! let cuts = vidfeatures::detect_cuts(&frames, 25.0);
//! println!("{} sampled frames, {cuts} cuts", frames.len());
//! # Ok::<(), vidfeatures::FeatureError>(())
//! ```
//!
//! ### Read video properties
//!
//! ```no_run
//! let properties = vidfeatures::open_properties("input.mp4")?;
//! println!("{:.2}s at {:.2} fps", properties.duration, properties.fps);
//! # Ok::<(), vidfeatures::FeatureError>(())
//! ```
//!
//! ### Full report
//!
//! Object detection and OCR are supplied by the caller through the
//! [`ObjectDetector`] and [`TextRecognizer`] traits; see
//! [`FeatureExtractor`] for a complete example and [`external`] for
//! adapters that drive external programs.
//!
//! ## Pipeline
//!
//! 1. **Property reading**: dimensions, frame rate, frame count, duration.
//! 2. **Frame sampling**: every Nth decoded frame, copied out of FFmpeg.
//! 3. **Signatures**: 256-bin luma histograms with unit L2 norm.
//! 4. **Shot-boundary detection**: correlation of consecutive signatures,
//!    `(1 - r) * 100` compared against a threshold.
//! 5. **Aggregation**: cut count, object dominance and text ratio merged
//!    into one report.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | Build frame signatures on rayon threads before comparing them in order |
//! | `full` | Enables all of the above |
//!
//! ## Logging
//!
//! The crate emits diagnostics through the [`log`](https://crates.io/crates/log)
//! facade and never installs a logger itself. Progress is delivered to an
//! injected [`ProgressCallback`].
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod analyzer;
pub mod configuration;
mod conversion;
pub mod error;
pub mod external;
pub mod ffmpeg;
pub mod frame;
pub mod objects;
pub mod progress;
pub mod properties;
pub mod report;
pub mod sampler;
pub mod shots;
pub mod signature;
pub mod text;

pub use analyzer::{FeatureExtractor, analyze};
pub use configuration::{
    AnalysisOptions, DEFAULT_CUT_THRESHOLD, DEFAULT_DETECTOR_BATCH_SIZE,
    DEFAULT_OCR_MIN_CONFIDENCE, DEFAULT_PRIMARY_CLASS_ID, DEFAULT_SAMPLE_RATE,
};
pub use error::{CollaboratorError, FeatureError};
pub use external::{ProcessDetector, ProcessRecognizer};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame::{Frame, FrameSequence};
pub use objects::{Dominance, ObjectAnalysis, ObjectDetector, analyze_objects};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo, Stage};
pub use properties::{VideoProperties, open_properties};
pub use report::{FeatureReport, ReportMetadata, default_report_path};
pub use sampler::{sample_frames, sample_frames_with_options};
pub use shots::{CutEvent, detect_cut_events, detect_cuts, dissimilarity};
pub use signature::{SIGNATURE_BINS, Signature, build_signature};
pub use text::{
    TextAnalysis, TextRecognition, TextRecognizer, TextRegion, analyze_text, stretch_contrast,
};
