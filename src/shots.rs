//! Hard-cut (shot boundary) detection.
//!
//! Consecutive sampled frames are compared through their [`Signature`]s. The
//! correlation `s` of two signatures becomes a dissimilarity score
//! `(1 - s) * 100`, which runs from 0 (identical) to 200 (perfectly
//! anti-correlated). A boundary whose score is strictly above the threshold
//! counts as a cut.
//!
//! # Example
//!
//! ```no_run
//! let frames = vidfeatures::sample_frames("input.mp4", 10)?;
//! let cuts = vidfeatures::detect_cuts(&frames, 25.0);
//! println!("{cuts} hard cuts");
//! # Ok::<(), vidfeatures::FeatureError>(())
//! ```

use serde::Serialize;

use crate::{
    frame::Frame,
    signature::{Signature, build_signature},
};

/// A detected hard cut between two adjacent sampled frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutEvent {
    /// Position in the sampled sequence of the first frame after the cut.
    pub position: usize,
    /// Source frame index of the first frame after the cut.
    pub source_index: u64,
    /// Correlation between the two signatures.
    pub similarity: f64,
    /// `(1 - similarity) * 100`.
    pub score: f64,
}

/// Dissimilarity score between two signatures: `(1 - correlation) * 100`.
///
/// Scores above 100 mean the histograms are negatively correlated; they are
/// reported as-is.
pub fn dissimilarity(previous: &Signature, current: &Signature) -> f64 {
    (1.0 - previous.correlation(current)) * 100.0
}

/// Count hard cuts in `frames`.
///
/// The first frame has nothing to compare against, so sequences of zero or
/// one frame always return 0. Raising `threshold` never increases the count.
pub fn detect_cuts(frames: &[Frame], threshold: f64) -> usize {
    detect_cut_events(frames, threshold).len()
}

/// Like [`detect_cuts`], returning where each cut happened.
pub fn detect_cut_events(frames: &[Frame], threshold: f64) -> Vec<CutEvent> {
    let mut events = Vec::new();
    let mut previous: Option<Signature> = None;

    for (position, (frame, current)) in frames.iter().zip(signatures(frames)).enumerate() {
        if let Some(previous) = &previous {
            let similarity = previous.correlation(&current);
            let score = (1.0 - similarity) * 100.0;
            if score > threshold {
                log::debug!(
                    "Cut before source frame {} (score={score:.2}, threshold={threshold})",
                    frame.source_index(),
                );
                events.push(CutEvent {
                    position,
                    source_index: frame.source_index(),
                    similarity,
                    score,
                });
            }
        }
        previous = Some(current);
    }

    events
}

#[cfg(not(feature = "rayon"))]
fn signatures(frames: &[Frame]) -> impl Iterator<Item = Signature> + '_ {
    frames.iter().map(build_signature)
}

// Signatures are independent, so they may be built out of order; the
// comparison loop above still walks them in temporal order.
#[cfg(feature = "rayon")]
fn signatures(frames: &[Frame]) -> impl Iterator<Item = Signature> + '_ {
    use ::rayon::iter::{IntoParallelRefIterator, ParallelIterator};

    let built: Vec<Signature> = frames.par_iter().map(build_signature).collect();
    built.into_iter()
}
