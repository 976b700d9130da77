//! Analysis configuration.
//!
//! [`AnalysisOptions`] is a builder that carries every tunable of a run
//! (sampling stride, cut threshold, OCR confidence, detector batching) along
//! with the injected progress sink and cancellation token.
//!
//! # Example
//!
//! ```
//! use vidfeatures::{AnalysisOptions, CancellationToken};
//!
//! let token = CancellationToken::new();
//! let options = AnalysisOptions::new()
//!     .with_sample_rate(5)
//!     .with_cut_threshold(30.0)
//!     .with_cancellation(token.clone());
//! assert_eq!(options.sample_rate(), 5);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::FeatureError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Default sampling stride: keep every 10th frame.
pub const DEFAULT_SAMPLE_RATE: u64 = 10;
/// Default dissimilarity score above which a hard cut is counted.
pub const DEFAULT_CUT_THRESHOLD: f64 = 25.0;
/// Default minimum OCR confidence for a frame to count as text-bearing.
pub const DEFAULT_OCR_MIN_CONFIDENCE: f64 = 60.0;
/// Default number of frames sent to the object detector per call.
pub const DEFAULT_DETECTOR_BATCH_SIZE: usize = 8;
/// Class id counted as "person" by default (COCO ordering).
pub const DEFAULT_PRIMARY_CLASS_ID: u32 = 0;

/// Settings for one analysis run.
///
/// A default-constructed value reproduces the stock pipeline: sample every
/// 10th frame, threshold 25.0, OCR confidence 60.0, batches of 8.
#[derive(Clone)]
pub struct AnalysisOptions {
    pub(crate) sample_rate: u64,
    pub(crate) cut_threshold: f64,
    pub(crate) ocr_min_confidence: f64,
    pub(crate) ocr_preprocess: bool,
    pub(crate) detector_batch_size: usize,
    pub(crate) primary_class_id: u32,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for AnalysisOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnalysisOptions")
            .field("sample_rate", &self.sample_rate)
            .field("cut_threshold", &self.cut_threshold)
            .field("ocr_min_confidence", &self.ocr_min_confidence)
            .field("ocr_preprocess", &self.ocr_preprocess)
            .field("detector_batch_size", &self.detector_batch_size)
            .field("primary_class_id", &self.primary_class_id)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish()
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            cut_threshold: DEFAULT_CUT_THRESHOLD,
            ocr_min_confidence: DEFAULT_OCR_MIN_CONFIDENCE,
            ocr_preprocess: true,
            detector_batch_size: DEFAULT_DETECTOR_BATCH_SIZE,
            primary_class_id: DEFAULT_PRIMARY_CLASS_ID,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Keep every `rate`-th frame.
    ///
    /// Zero is stored as given and rejected by [`validate`](Self::validate).
    #[must_use]
    pub fn with_sample_rate(mut self, rate: u64) -> Self {
        self.sample_rate = rate;
        self
    }

    /// Set the dissimilarity score above which a cut is counted.
    #[must_use]
    pub fn with_cut_threshold(mut self, threshold: f64) -> Self {
        self.cut_threshold = threshold;
        self
    }

    /// Set the minimum OCR confidence for a text region to count.
    #[must_use]
    pub fn with_ocr_min_confidence(mut self, confidence: f64) -> Self {
        self.ocr_min_confidence = confidence;
        self
    }

    /// Enable or disable contrast stretching before OCR.
    #[must_use]
    pub fn with_ocr_preprocess(mut self, enabled: bool) -> Self {
        self.ocr_preprocess = enabled;
        self
    }

    /// Set how many frames are handed to the object detector per call.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_detector_batch_size(mut self, size: usize) -> Self {
        self.detector_batch_size = size.max(1);
        self
    }

    /// Set the class id counted as "person".
    #[must_use]
    pub fn with_primary_class_id(mut self, class_id: u32) -> Self {
        self.primary_class_id = class_id;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Sampling stride.
    pub fn sample_rate(&self) -> u64 {
        self.sample_rate
    }

    /// Cut threshold.
    pub fn cut_threshold(&self) -> f64 {
        self.cut_threshold
    }

    /// Minimum OCR confidence.
    pub fn ocr_min_confidence(&self) -> f64 {
        self.ocr_min_confidence
    }

    /// Detector batch size.
    pub fn detector_batch_size(&self) -> usize {
        self.detector_batch_size
    }

    /// Reject settings that cannot drive a run.
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.sample_rate == 0 {
            return Err(FeatureError::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }

    pub(crate) fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }
}
