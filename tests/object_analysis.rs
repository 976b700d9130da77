//! Object dominance tests against scripted detectors.

use std::error::Error;

use image::RgbImage;
use vidfeatures::{
    AnalysisOptions, CancellationToken, CollaboratorError, Dominance, FeatureError, Frame,
    ObjectAnalysis, ObjectDetector, Stage, analyze_objects,
};

fn frames(count: u64) -> Vec<Frame> {
    (0..count)
        .map(|index| Frame::new(index * 10, RgbImage::new(8, 8)))
        .collect()
}

/// Replays one scripted detection list per frame and records batch sizes.
struct ScriptedDetector {
    script: Vec<Vec<u32>>,
    cursor: usize,
    batches: Vec<usize>,
}

impl ScriptedDetector {
    fn new(script: Vec<Vec<u32>>) -> Self {
        Self {
            script,
            cursor: 0,
            batches: Vec::new(),
        }
    }
}

impl ObjectDetector for ScriptedDetector {
    fn detect(&mut self, frames: &[Frame]) -> Result<Vec<Vec<u32>>, CollaboratorError> {
        self.batches.push(frames.len());
        let end = self.cursor + frames.len();
        let result = self.script[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(result)
    }
}

struct FailingDetector;

impl ObjectDetector for FailingDetector {
    fn detect(&mut self, _frames: &[Frame]) -> Result<Vec<Vec<u32>>, CollaboratorError> {
        Err("model weights missing".into())
    }
}

/// Always answers with a single entry regardless of batch size.
struct ShortDetector;

impl ObjectDetector for ShortDetector {
    fn detect(&mut self, _frames: &[Frame]) -> Result<Vec<Vec<u32>>, CollaboratorError> {
        Ok(vec![vec![0]])
    }
}

// ── Tallies and dominance ──────────────────────────────────────────

#[test]
fn equal_tallies_are_balanced() {
    let mut detector = ScriptedDetector::new(vec![vec![0, 2], vec![0], vec![3]]);
    let analysis =
        analyze_objects(&mut detector, &frames(3), &AnalysisOptions::new()).expect("analyze");

    assert_eq!(analysis.person_count, 2);
    assert_eq!(analysis.object_count, 2);
    assert_eq!(analysis.person_ratio, 0.5);
    assert_eq!(analysis.object_ratio, 0.5);
    assert_eq!(analysis.dominance, Dominance::Balanced);
}

#[test]
fn five_persons_and_five_objects_are_balanced() {
    let mut detector = ScriptedDetector::new(vec![vec![0, 7], vec![0, 0, 3], vec![0, 0, 9, 9, 1]]);
    let analysis =
        analyze_objects(&mut detector, &frames(3), &AnalysisOptions::new()).expect("analyze");

    assert_eq!((analysis.person_count, analysis.object_count), (5, 5));
    assert_eq!(analysis.dominance, Dominance::Balanced);
}

#[test]
fn more_persons_is_person_dominance() {
    let mut detector = ScriptedDetector::new(vec![vec![0, 0, 0], vec![1]]);
    let analysis =
        analyze_objects(&mut detector, &frames(2), &AnalysisOptions::new()).expect("analyze");

    assert_eq!(analysis.dominance, Dominance::Person);
    assert_eq!(analysis.person_ratio, 0.75);
    assert_eq!(analysis.object_ratio, 0.25);
}

#[test]
fn more_objects_is_object_dominance() {
    let mut detector = ScriptedDetector::new(vec![vec![56, 41], vec![], vec![0, 62]]);
    let analysis =
        analyze_objects(&mut detector, &frames(3), &AnalysisOptions::new()).expect("analyze");

    assert_eq!(analysis.person_count, 1);
    assert_eq!(analysis.object_count, 3);
    assert_eq!(analysis.dominance, Dominance::Object);
}

#[test]
fn no_detections_is_balanced_with_zero_ratios() {
    let mut detector = ScriptedDetector::new(vec![Vec::new(); 4]);
    let analysis =
        analyze_objects(&mut detector, &frames(4), &AnalysisOptions::new()).expect("analyze");

    assert_eq!(analysis, ObjectAnalysis::from_counts(0, 0));
    assert_eq!(analysis.person_ratio, 0.0);
    assert_eq!(analysis.object_ratio, 0.0);
    assert_eq!(analysis.dominance, Dominance::Balanced);
}

#[test]
fn ratios_sum_to_one_when_anything_was_detected() {
    for (persons, objects) in [(1, 0), (0, 1), (3, 7), (13, 2)] {
        let analysis = ObjectAnalysis::from_counts(persons, objects);
        assert!((analysis.person_ratio + analysis.object_ratio - 1.0).abs() < 1e-12);
    }
}

#[test]
fn primary_class_is_configurable() {
    let mut detector = ScriptedDetector::new(vec![vec![0, 0], vec![2]]);
    let options = AnalysisOptions::new().with_primary_class_id(2);
    let analysis = analyze_objects(&mut detector, &frames(2), &options).expect("analyze");

    assert_eq!(analysis.person_count, 1);
    assert_eq!(analysis.object_count, 2);
    assert_eq!(analysis.dominance, Dominance::Object);
}

#[test]
fn dominance_serializes_lowercase() {
    let json = serde_json::to_value(ObjectAnalysis::from_counts(4, 1)).expect("serialize");
    assert_eq!(json["dominance"], "person");
    assert_eq!(json["person_count"], 4);
    assert_eq!(Dominance::Balanced.to_string(), "balanced");
}

// ── Batching ─────────────────────────────────────────────────────

#[test]
fn frames_are_sent_in_configured_batches() {
    let mut detector = ScriptedDetector::new(vec![vec![0]; 7]);
    let options = AnalysisOptions::new().with_detector_batch_size(3);
    let analysis = analyze_objects(&mut detector, &frames(7), &options).expect("analyze");

    assert_eq!(detector.batches, vec![3, 3, 1]);
    assert_eq!(analysis.person_count, 7);
}

#[test]
fn empty_input_never_calls_detector() {
    let mut detector = ScriptedDetector::new(Vec::new());
    let analysis =
        analyze_objects(&mut detector, &[], &AnalysisOptions::new()).expect("analyze");

    assert!(detector.batches.is_empty());
    assert_eq!(analysis.dominance, Dominance::Balanced);
}

// ── Failures ─────────────────────────────────────────────────────

#[test]
fn detector_error_is_tagged_with_stage() {
    let error = analyze_objects(&mut FailingDetector, &frames(2), &AnalysisOptions::new())
        .expect_err("detector failure must abort");

    assert!(matches!(
        error,
        FeatureError::Collaborator {
            stage: Stage::ObjectDetection,
            ..
        }
    ));
    let source = error.source().expect("source");
    assert_eq!(source.to_string(), "model weights missing");
}

#[test]
fn short_result_list_is_rejected() {
    let options = AnalysisOptions::new().with_detector_batch_size(4);
    let result = analyze_objects(&mut ShortDetector, &frames(4), &options);
    assert!(matches!(
        result,
        Err(FeatureError::Collaborator {
            stage: Stage::ObjectDetection,
            ..
        })
    ));
}

#[test]
fn cancelled_token_stops_before_first_batch() {
    let token = CancellationToken::new();
    token.cancel();
    let mut detector = ScriptedDetector::new(vec![vec![0]; 3]);
    let options = AnalysisOptions::new().with_cancellation(token);

    let result = analyze_objects(&mut detector, &frames(3), &options);
    assert!(matches!(result, Err(FeatureError::Cancelled)));
    assert!(detector.batches.is_empty());
}
