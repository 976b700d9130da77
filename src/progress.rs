//! Progress reporting and cancellation support.
//!
//! The analysis pipeline never writes to a global sink on its own behalf.
//! Callers inject a [`ProgressCallback`] through
//! [`AnalysisOptions`](crate::AnalysisOptions) to observe each [`Stage`], and
//! hand out a [`CancellationToken`] to abort a run from another thread.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidfeatures::{AnalysisOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{}] {pct:.1}% complete", info.stage);
//!         }
//!     }
//! }
//!
//! let options = AnalysisOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use crate::error::FeatureError;

/// A step of the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Stage {
    /// Reading container properties.
    Probing,
    /// Decoding and sampling frames.
    Sampling,
    /// Comparing consecutive frame signatures.
    ShotDetection,
    /// Running the external object detector.
    ObjectDetection,
    /// Running the external text recognizer.
    TextRecognition,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Stage::Probing => "probing",
            Stage::Sampling => "sampling",
            Stage::ShotDetection => "shot detection",
            Stage::ObjectDetection => "object detection",
            Stage::TextRecognition => "text recognition",
        };
        f.write_str(name)
    }
}

/// A snapshot of pipeline progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Stage currently running.
    pub stage: Stage,
    /// Items (frames or batches) completed so far in this stage.
    pub current: u64,
    /// Total items expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 to 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the stage started.
    pub elapsed: Duration,
    /// Source frame index most recently handled, if any.
    pub current_frame: Option<u64>,
}

/// Receives progress updates during analysis.
///
/// Callbacks are infallible: they observe the run but cannot halt it. Use a
/// [`CancellationToken`] to stop a run.
pub trait ProgressCallback: Send + Sync {
    /// Called as items complete within a stage.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called once when a stage begins.
    fn on_stage_start(&self, _stage: Stage) {}
}

/// Discards all notifications. Default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state, so a token handed to another thread can cancel the
/// run that owns the original.
///
/// ```
/// use vidfeatures::CancellationToken;
///
/// let token = CancellationToken::new();
/// let remote = token.clone();
/// remote.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Return [`FeatureError::Cancelled`] if the token has fired.
pub(crate) fn check_cancelled(token: Option<&CancellationToken>) -> Result<(), FeatureError> {
    match token {
        Some(token) if token.is_cancelled() => Err(FeatureError::Cancelled),
        _ => Ok(()),
    }
}

/// Tracks timing for one stage and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    stage: Stage,
    total: Option<u64>,
    current: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, stage: Stage, total: Option<u64>) -> Self {
        callback.on_stage_start(stage);
        Self {
            callback,
            stage,
            total,
            current: 0,
            start_time: Instant::now(),
        }
    }

    /// Record `count` completed items and report.
    pub(crate) fn advance(&mut self, count: u64, frame: Option<u64>) {
        self.current += count;
        self.report(frame);
    }

    fn report(&self, frame: Option<u64>) {
        // Container frame counts are estimates; never report past 100%.
        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current.min(total) as f32 / total as f32) * 100.0);

        let info = ProgressInfo {
            stage: self.stage,
            current: self.current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
            current_frame: frame,
        };

        self.callback.on_progress(&info);
    }
}
