//! The feature report.
//!
//! A [`FeatureReport`] is built once per successful run and serializes to a
//! JSON object with exactly four top-level keys: `metadata`, `shot_cuts`,
//! `text_present_ratio` and `object_analysis`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::{error::FeatureError, objects::ObjectAnalysis, properties::VideoProperties};

/// Run metadata: where the report came from and how it was sampled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    /// Absolute path of the analyzed file.
    pub file_path: PathBuf,
    /// When the analysis finished.
    pub timestamp: DateTime<Local>,
    /// Sampling stride used.
    pub sample_rate: u64,
    /// Container properties, flattened into this object.
    #[serde(flatten)]
    pub properties: VideoProperties,
    /// Number of frames retained by the sampler.
    pub sampled_frames: u64,
    /// Frames the OCR engine declined to process.
    pub ocr_skipped_frames: u64,
}

/// Features extracted from one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[must_use]
pub struct FeatureReport {
    /// Run metadata.
    pub metadata: ReportMetadata,
    /// Number of hard cuts between sampled frames.
    pub shot_cuts: usize,
    /// Fraction of sampled frames containing confident text.
    pub text_present_ratio: f64,
    /// Person versus object tallies.
    pub object_analysis: ObjectAnalysis,
}

impl FeatureReport {
    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, FeatureError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty-printed JSON to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FeatureError> {
        let path = path.as_ref();
        fs::write(path, self.to_json_pretty()?)?;
        log::info!("Results saved to {}", path.display());
        Ok(())
    }
}

/// `results_YYYYmmdd_HHMMSS.json` for the current local time.
pub fn default_report_path() -> PathBuf {
    PathBuf::from(format!(
        "results_{}.json",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}
