//! AnalysisOptions, progress and cancellation tests.

use std::sync::{Arc, Mutex};

use image::RgbImage;
use vidfeatures::{
    AnalysisOptions, CancellationToken, CollaboratorError, DEFAULT_CUT_THRESHOLD,
    DEFAULT_DETECTOR_BATCH_SIZE, DEFAULT_OCR_MIN_CONFIDENCE, DEFAULT_SAMPLE_RATE, FeatureError,
    Frame, ObjectDetector, ProgressCallback, ProgressInfo, Stage, analyze_objects,
};

// ── AnalysisOptions builder ──────────────────────────────────────

#[test]
fn options_defaults() {
    let options = AnalysisOptions::new();
    assert_eq!(options.sample_rate(), DEFAULT_SAMPLE_RATE);
    assert_eq!(options.sample_rate(), 10);
    assert_eq!(options.cut_threshold(), DEFAULT_CUT_THRESHOLD);
    assert_eq!(options.cut_threshold(), 25.0);
    assert_eq!(options.ocr_min_confidence(), DEFAULT_OCR_MIN_CONFIDENCE);
    assert_eq!(options.detector_batch_size(), DEFAULT_DETECTOR_BATCH_SIZE);

    let debug = format!("{options:?}");
    assert!(debug.contains("AnalysisOptions"));
    assert!(debug.contains("has_cancellation: false"));
    assert!(debug.contains("ocr_preprocess: true"));
}

#[test]
fn options_default_trait_matches_new() {
    let debug_new = format!("{:?}", AnalysisOptions::new());
    let debug_default = format!("{:?}", AnalysisOptions::default());
    assert_eq!(debug_new, debug_default);
}

#[test]
fn options_with_cancellation_shows_in_debug() {
    let options = AnalysisOptions::new().with_cancellation(CancellationToken::new());
    assert!(format!("{options:?}").contains("has_cancellation: true"));
}

#[test]
fn batch_size_clamps_zero() {
    let options = AnalysisOptions::new().with_detector_batch_size(0);
    assert_eq!(options.detector_batch_size(), 1);
}

#[test]
fn zero_sample_rate_fails_validation() {
    let options = AnalysisOptions::new().with_sample_rate(0);
    assert!(matches!(
        options.validate(),
        Err(FeatureError::InvalidSampleRate(0))
    ));
    assert!(AnalysisOptions::new().with_sample_rate(1).validate().is_ok());
}

#[test]
fn error_messages_name_the_problem() {
    assert_eq!(
        FeatureError::InvalidSampleRate(0).to_string(),
        "Sample rate must be a positive integer (got 0)"
    );
    let error = FeatureError::collaborator(Stage::TextRecognition, "engine crashed".into());
    assert_eq!(
        error.to_string(),
        "text recognition collaborator failed: engine crashed"
    );
}

// ── CancellationToken ────────────────────────────────────────────

#[test]
fn cancellation_token_default_not_cancelled() {
    assert!(!CancellationToken::new().is_cancelled());
    assert!(!CancellationToken::default().is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn cancellation_from_another_thread() {
    let token = CancellationToken::new();
    let remote = token.clone();
    std::thread::spawn(move || remote.cancel())
        .join()
        .expect("join");
    assert!(token.is_cancelled());
}

// ── ProgressCallback ─────────────────────────────────────────────

#[derive(Default)]
struct RecordingProgress {
    starts: Mutex<Vec<Stage>>,
    infos: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().expect("lock").push(info.clone());
    }

    fn on_stage_start(&self, stage: Stage) {
        self.starts.lock().expect("lock").push(stage);
    }
}

struct NothingDetector;

impl ObjectDetector for NothingDetector {
    fn detect(&mut self, frames: &[Frame]) -> Result<Vec<Vec<u32>>, CollaboratorError> {
        Ok(vec![Vec::new(); frames.len()])
    }
}

#[test]
fn progress_is_reported_per_batch() {
    let progress = Arc::new(RecordingProgress::default());
    let options = AnalysisOptions::new()
        .with_detector_batch_size(2)
        .with_progress(progress.clone());
    let frames: Vec<Frame> = (0..5)
        .map(|index| Frame::new(index * 10, RgbImage::new(4, 4)))
        .collect();

    analyze_objects(&mut NothingDetector, &frames, &options).expect("analyze");

    assert_eq!(
        *progress.starts.lock().expect("lock"),
        vec![Stage::ObjectDetection]
    );

    let infos = progress.infos.lock().expect("lock");
    let currents: Vec<u64> = infos.iter().map(|info| info.current).collect();
    assert_eq!(currents, vec![2, 4, 5]);
    let last = infos.last().expect("at least one update");
    assert_eq!(last.total, Some(5));
    assert_eq!(last.percentage, Some(100.0));
    assert_eq!(last.current_frame, Some(40));
    assert!(
        infos
            .iter()
            .filter_map(|info| info.percentage)
            .all(|pct| (0.0..=100.0).contains(&pct))
    );
}

#[test]
fn stage_names_are_human_readable() {
    assert_eq!(Stage::Sampling.to_string(), "sampling");
    assert_eq!(Stage::ShotDetection.to_string(), "shot detection");
    assert_eq!(Stage::ObjectDetection.to_string(), "object detection");
}
