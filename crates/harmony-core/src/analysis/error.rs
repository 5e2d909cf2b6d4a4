//! Analysis module error types

use thiserror::Error;

/// Errors raised while building an extractor
///
/// All of these are configuration problems detected before the first block
/// is analysed; `extract` itself never fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Block size is zero or not a multiple of the pitch sub-frame divisor
    #[error("Invalid analysis block size {block_size} (pitch frame divisor {divisor})")]
    InvalidBlockSize { block_size: usize, divisor: usize },

    /// Frequency range is empty, or does not fit below Nyquist
    #[error("Invalid frequency range {lowest:.1}Hz-{highest:.1}Hz at {sample_rate}Hz")]
    InvalidFrequencyRange {
        lowest: f32,
        highest: f32,
        sample_rate: u32,
    },

    /// Pitch sub-frames are too short to hold the longest period of the range
    #[error("Pitch frame of {frame} samples cannot resolve periods up to {max_lag} samples")]
    PitchWindowTooShort { frame: usize, max_lag: usize },
}
