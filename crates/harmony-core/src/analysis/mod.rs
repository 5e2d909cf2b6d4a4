//! Per-window feature extraction
//!
//! The tracker only needs four things from each analysis window: a chroma
//! vector, a melody pitch estimate with its confidence, and the RMS level.
//! [`Extractor`] is the seam for whatever produces them; [`SpectralExtractor`]
//! is the built-in implementation.

mod error;
mod spectral;

pub use error::AnalysisError;
pub use spectral::SpectralExtractor;

use crate::types::NUM_PITCH_CLASSES;

/// Features of one analysis window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extraction {
    /// Harmonic energy per pitch class, index 0 = C
    pub chroma: [f32; NUM_PITCH_CLASSES],
    /// Monophonic pitch estimate in Hz, `None` when no part of the window was voiced
    pub pitch_hz: Option<f32>,
    /// Confidence of the pitch estimate
    pub pitch_confidence: f32,
    /// RMS level of the window
    pub rms: f32,
}

impl Extraction {
    /// Window without any evidence
    pub fn silence() -> Self {
        Self {
            chroma: [0.0; NUM_PITCH_CLASSES],
            pitch_hz: None,
            pitch_confidence: 0.0,
            rms: 0.0,
        }
    }
}

impl Default for Extraction {
    fn default() -> Self {
        Self::silence()
    }
}

/// Turns one fixed-size block of mono samples into an [`Extraction`]
///
/// Called from the audio thread: implementations must not allocate, lock or
/// block inside `extract`. The sample rate is fixed when the extractor is
/// built.
pub trait Extractor: Send {
    /// Samples per block this extractor expects
    fn block_size(&self) -> usize;

    /// Sample rate the extractor was built for
    fn sample_rate(&self) -> u32;

    /// Analyse one block of exactly `block_size()` samples
    fn extract(&mut self, block: &[f32]) -> Extraction;
}

/// RMS level of a block
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}
