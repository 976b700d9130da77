//! The analysis pipeline.
//!
//! [`FeatureExtractor`] runs property reading, frame sampling, shot-boundary
//! detection, and the object and text collaborators in sequence, then
//! assembles a [`FeatureReport`]. The run is all-or-nothing: the first error
//! from any stage is returned unchanged and no report is produced.
//!
//! # Example
//!
//! ```no_run
//! use image::RgbImage;
//! use vidfeatures::{
//!     AnalysisOptions, CollaboratorError, FeatureExtractor, Frame, ObjectDetector,
//!     TextRecognition, TextRecognizer,
//! };
//!
//! struct Detector;
//! impl ObjectDetector for Detector {
//!     fn detect(&mut self, frames: &[Frame]) -> Result<Vec<Vec<u32>>, CollaboratorError> {
//!         Ok(vec![Vec::new(); frames.len()])
//!     }
//! }
//!
//! struct Ocr;
//! impl TextRecognizer for Ocr {
//!     fn recognize(&mut self, _image: &RgbImage) -> Result<TextRecognition, CollaboratorError> {
//!         Ok(TextRecognition::Regions(Vec::new()))
//!     }
//! }
//!
//! let mut extractor = FeatureExtractor::new(Detector, Ocr)
//!     .with_options(AnalysisOptions::new().with_sample_rate(5));
//! let report = extractor.analyze("input.mp4")?;
//! println!("{}", report.to_json_pretty()?);
//! # Ok::<(), vidfeatures::FeatureError>(())
//! ```

use std::path::Path;

use chrono::Local;

use crate::{
    configuration::AnalysisOptions,
    error::FeatureError,
    objects::{ObjectDetector, analyze_objects},
    progress::{self, ProgressTracker, Stage},
    properties::open_properties,
    report::{FeatureReport, ReportMetadata},
    sampler::sample_frames_with_options,
    shots::detect_cuts,
    text::{TextRecognizer, analyze_text},
};

/// Runs the full pipeline with a given detector and recognizer.
pub struct FeatureExtractor<D, R> {
    detector: D,
    recognizer: R,
    options: AnalysisOptions,
}

impl<D: ObjectDetector, R: TextRecognizer> FeatureExtractor<D, R> {
    /// Create an extractor with default [`AnalysisOptions`].
    pub fn new(detector: D, recognizer: R) -> Self {
        Self {
            detector,
            recognizer,
            options: AnalysisOptions::new(),
        }
    }

    /// Replace the analysis options.
    #[must_use]
    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    /// Options in effect.
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyze the video at `path`.
    ///
    /// # Errors
    ///
    /// - [`FeatureError::InvalidSampleRate`] for a zero sample rate.
    /// - [`FeatureError::NotFound`] if `path` is not a file.
    /// - [`FeatureError::FileOpen`] / [`FeatureError::NoVideoStream`] if the
    ///   container cannot be opened.
    /// - [`FeatureError::EmptyResult`] if sampling keeps no frames.
    /// - [`FeatureError::Collaborator`] if the detector or recognizer fails.
    /// - [`FeatureError::Cancelled`] if the cancellation token fires.
    pub fn analyze<P: AsRef<Path>>(&mut self, path: P) -> Result<FeatureReport, FeatureError> {
        let path = path.as_ref();
        let options = &self.options;
        options.validate()?;

        if !path.is_file() {
            return Err(FeatureError::NotFound {
                path: path.to_path_buf(),
            });
        }

        log::info!("Starting analysis of {}", path.display());

        let result = self.run(path);

        match &result {
            Ok(report) => log::info!(
                "Analysis of {} completed: {} cuts, text ratio {:.2}, dominance {}",
                path.display(),
                report.shot_cuts,
                report.text_present_ratio,
                report.object_analysis.dominance,
            ),
            Err(error) => log::error!("Error analyzing {}: {error}", path.display()),
        }

        result
    }

    fn run(&mut self, path: &Path) -> Result<FeatureReport, FeatureError> {
        let options = &self.options;

        let mut probe = ProgressTracker::new(options.progress.clone(), Stage::Probing, Some(1));
        let properties = open_properties(path)?;
        probe.advance(1, None);

        progress::check_cancelled(options.cancellation())?;
        let frames = sample_frames_with_options(path, options)?;
        log::info!(
            "Extracted {} frames from {} total frames",
            frames.len(),
            properties.frame_count,
        );

        progress::check_cancelled(options.cancellation())?;
        let mut shots = ProgressTracker::new(
            options.progress.clone(),
            Stage::ShotDetection,
            Some(frames.len() as u64),
        );
        let shot_cuts = detect_cuts(&frames, options.cut_threshold);
        shots.advance(frames.len() as u64, frames.last().map(|frame| frame.source_index()));

        let object_analysis = analyze_objects(&mut self.detector, &frames, options)?;
        let text_analysis = analyze_text(&mut self.recognizer, &frames, options)?;

        Ok(FeatureReport {
            metadata: ReportMetadata {
                file_path: std::path::absolute(path)?,
                timestamp: Local::now(),
                sample_rate: frames.sample_rate(),
                properties,
                sampled_frames: frames.len() as u64,
                ocr_skipped_frames: text_analysis.frames_skipped,
            },
            shot_cuts,
            text_present_ratio: text_analysis.text_present_ratio,
            object_analysis,
        })
    }
}

/// Analyze `path` with default options and the given sample rate.
///
/// Convenience wrapper around [`FeatureExtractor`].
pub fn analyze<P, D, R>(
    path: P,
    sample_rate: u64,
    detector: D,
    recognizer: R,
) -> Result<FeatureReport, FeatureError>
where
    P: AsRef<Path>,
    D: ObjectDetector,
    R: TextRecognizer,
{
    FeatureExtractor::new(detector, recognizer)
        .with_options(AnalysisOptions::new().with_sample_rate(sample_rate))
        .analyze(path)
}
