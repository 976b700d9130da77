//! Frame signatures.
//!
//! A [`Signature`] is a 256-bin luma histogram scaled to unit L2 norm. L2
//! scaling makes two frames with the same luma distribution produce the same
//! signature regardless of resolution, which is what lets a single cut
//! threshold work across videos of different sizes.
//!
//! Luma uses the BT.601 weights (0.299 R + 0.587 G + 0.114 B) in 14-bit
//! fixed point, rounded to nearest, so gray pixels map to their own level.

use image::{Rgb, RgbImage};

use crate::frame::Frame;

/// Number of histogram bins, one per 8-bit luma level.
pub const SIGNATURE_BINS: usize = 256;

const LUMA_SHIFT: u32 = 14;
// BT.601 weights scaled by 2^14; they sum to exactly 1 << 14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

/// BT.601 luma of one pixel.
pub fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    let weighted = u32::from(r) * LUMA_R + u32::from(g) * LUMA_G + u32::from(b) * LUMA_B;
    ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

/// Normalized luma histogram of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    bins: [f64; SIGNATURE_BINS],
}

impl Signature {
    /// Build the signature of an RGB image.
    pub fn from_image(image: &RgbImage) -> Self {
        let mut bins = [0.0_f64; SIGNATURE_BINS];
        for pixel in image.pixels() {
            bins[usize::from(luma(pixel))] += 1.0;
        }

        let norm = bins.iter().map(|count| count * count).sum::<f64>().sqrt();
        if norm > 0.0 {
            for bin in &mut bins {
                *bin /= norm;
            }
        }

        Self { bins }
    }

    /// Histogram bins, each in `[0, 1]`.
    pub fn bins(&self) -> &[f64; SIGNATURE_BINS] {
        &self.bins
    }

    /// Pearson correlation between two signatures, in `[-1, 1]`.
    ///
    /// `1.0` means identical luma distributions. If either histogram has no
    /// variance (every bin equal) the coefficient is undefined and the result
    /// is `1.0`, so a flat histogram never registers as a cut.
    pub fn correlation(&self, other: &Signature) -> f64 {
        let mean_a = self.bins.iter().sum::<f64>() / SIGNATURE_BINS as f64;
        let mean_b = other.bins.iter().sum::<f64>() / SIGNATURE_BINS as f64;

        let mut covariance = 0.0;
        let mut variance_a = 0.0;
        let mut variance_b = 0.0;
        for (a, b) in self.bins.iter().zip(other.bins.iter()) {
            let da = a - mean_a;
            let db = b - mean_b;
            covariance += da * db;
            variance_a += da * da;
            variance_b += db * db;
        }

        let product = variance_a * variance_b;
        if product <= f64::EPSILON {
            return 1.0;
        }
        (covariance / product.sqrt()).clamp(-1.0, 1.0)
    }
}

/// Build the signature of a sampled frame.
pub fn build_signature(frame: &Frame) -> Signature {
    Signature::from_image(frame.image())
}
