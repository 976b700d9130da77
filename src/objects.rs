//! Object/person dominance analysis.
//!
//! Object detection itself is delegated to an [`ObjectDetector`]. This module
//! batches frames into it, tallies detections of the primary class (persons
//! by default) against everything else, and reduces the tallies to an
//! [`ObjectAnalysis`].

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::{
    configuration::AnalysisOptions,
    error::{CollaboratorError, FeatureError},
    frame::Frame,
    progress::{self, ProgressTracker, Stage},
};

/// An external object detector.
///
/// Given a batch of frames, returns one entry per frame listing the class id
/// of every detected object.
pub trait ObjectDetector {
    /// Detect objects in `frames`.
    ///
    /// The outer vector must have one entry per input frame.
    fn detect(&mut self, frames: &[Frame]) -> Result<Vec<Vec<u32>>, CollaboratorError>;
}

impl<D: ObjectDetector + ?Sized> ObjectDetector for &mut D {
    fn detect(&mut self, frames: &[Frame]) -> Result<Vec<Vec<u32>>, CollaboratorError> {
        (**self).detect(frames)
    }
}

impl<D: ObjectDetector + ?Sized> ObjectDetector for Box<D> {
    fn detect(&mut self, frames: &[Frame]) -> Result<Vec<Vec<u32>>, CollaboratorError> {
        (**self).detect(frames)
    }
}

/// Which detection category dominates the analyzed frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dominance {
    /// More primary-class (person) detections than others.
    Person,
    /// More non-primary detections than persons.
    Object,
    /// Exactly as many persons as other objects, including none at all.
    Balanced,
}

impl Dominance {
    /// Resolve dominance from the two tallies. Equal counts are `Balanced`.
    pub fn from_counts(person_count: u64, object_count: u64) -> Self {
        match person_count.cmp(&object_count) {
            std::cmp::Ordering::Greater => Dominance::Person,
            std::cmp::Ordering::Less => Dominance::Object,
            std::cmp::Ordering::Equal => Dominance::Balanced,
        }
    }
}

impl Display for Dominance {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Dominance::Person => "person",
            Dominance::Object => "object",
            Dominance::Balanced => "balanced",
        })
    }
}

/// Person versus object tallies across all analyzed frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectAnalysis {
    /// Detections of the primary class.
    pub person_count: u64,
    /// Detections of every other class.
    pub object_count: u64,
    /// `person_count / total`, or 0 when nothing was detected.
    pub person_ratio: f64,
    /// `object_count / total`, or 0 when nothing was detected.
    pub object_ratio: f64,
    /// Which tally is larger.
    pub dominance: Dominance,
}

impl ObjectAnalysis {
    /// Derive ratios and dominance from raw tallies.
    pub fn from_counts(person_count: u64, object_count: u64) -> Self {
        let total = person_count + object_count;
        let ratio = |count: u64| {
            if total > 0 {
                count as f64 / total as f64
            } else {
                0.0
            }
        };
        Self {
            person_count,
            object_count,
            person_ratio: ratio(person_count),
            object_ratio: ratio(object_count),
            dominance: Dominance::from_counts(person_count, object_count),
        }
    }
}

/// Run `detector` over `frames` in batches and tally the results.
///
/// Batch size, the primary class id, progress and cancellation come from
/// `options`.
///
/// # Errors
///
/// [`FeatureError::Collaborator`] if the detector fails or returns a
/// different number of entries than frames it was given;
/// [`FeatureError::Cancelled`] if cancellation fires between batches.
pub fn analyze_objects<D: ObjectDetector + ?Sized>(
    detector: &mut D,
    frames: &[Frame],
    options: &AnalysisOptions,
) -> Result<ObjectAnalysis, FeatureError> {
    let batch_size = options.detector_batch_size.max(1);
    let primary_class_id = options.primary_class_id;
    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        Stage::ObjectDetection,
        Some(frames.len() as u64),
    );

    let mut person_count = 0_u64;
    let mut object_count = 0_u64;

    for batch in frames.chunks(batch_size) {
        progress::check_cancelled(options.cancellation())?;

        let detections = detector
            .detect(batch)
            .map_err(|source| FeatureError::collaborator(Stage::ObjectDetection, source))?;

        if detections.len() != batch.len() {
            return Err(FeatureError::collaborator(
                Stage::ObjectDetection,
                format!(
                    "detector returned {} results for a batch of {} frames",
                    detections.len(),
                    batch.len()
                )
                .into(),
            ));
        }

        for class_id in detections.iter().flatten() {
            if *class_id == primary_class_id {
                person_count += 1;
            } else {
                object_count += 1;
            }
        }

        tracker.advance(batch.len() as u64, batch.last().map(Frame::source_index));
    }

    let analysis = ObjectAnalysis::from_counts(person_count, object_count);
    log::debug!(
        "Object analysis: {} persons, {} objects, dominance={}",
        analysis.person_count,
        analysis.object_count,
        analysis.dominance,
    );
    Ok(analysis)
}
