//! Tracking, analysis and transport configuration
//!
//! All constants of the candidate tracker are tunables rather than fixed
//! contracts: debounce and expiry lengths as well as the aging asymmetry are
//! a matter of feel and are meant to be adjusted empirically.

use serde::{Deserialize, Serialize};

/// Reference note of the analysis range: C2
pub const DEFAULT_LOWEST_FREQUENCY: f32 = 65.406_39;

/// Candidate tracker tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum chroma energy for a pitch class to count as present
    /// The reference extractor normalises chroma to unit maximum, so 1.0
    /// only admits the strongest class(es) of each window.
    /// Default: 1.0
    pub detection_threshold: f32,

    /// Consecutive windows of evidence before a class becomes active (D)
    /// Default: 2
    pub min_duration: u32,

    /// Stimulus-free windows after which a usual suspect is dropped (E)
    /// Default: 10
    pub expiry: u32,

    /// Age added per window while a usual suspect has no evidence at all
    /// Default: 1
    pub inactive_step: u32,

    /// Age removed per window while a usual suspect is active but dominated
    /// Default: 2
    pub reactivation_step: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            detection_threshold: 1.0,
            min_duration: 2,
            expiry: 10,
            inactive_step: 1,
            reactivation_step: 2,
        }
    }
}

/// Extraction window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Samples per analysis window
    /// Default: 8192 (~170ms at 48kHz)
    pub block_size: usize,

    /// Lowest analysed frequency in Hz, also the semitone reference
    /// Default: C2 (65.41 Hz)
    pub lowest_frequency: f32,

    /// Number of octaves analysed above `lowest_frequency`
    /// Default: 6
    pub octaves: u32,

    /// The pitch tracker splits each window into sub-frames of
    /// `block_size / pitch_frame_divisor` samples
    /// Default: 4
    pub pitch_frame_divisor: usize,

    /// Normalised YIN difference below which a sub-frame counts as voiced
    /// Default: 0.2
    pub voicing_threshold: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            block_size: 8192,
            lowest_frequency: DEFAULT_LOWEST_FREQUENCY,
            octaves: 6,
            pitch_frame_divisor: 4,
            voicing_threshold: 0.2,
        }
    }
}

impl AnalysisConfig {
    /// Upper edge of the analysed range in Hz (one semitone below the top octave boundary)
    pub fn highest_frequency(&self) -> f32 {
        let semitones = (self.octaves * 12).saturating_sub(1) as f32;
        self.lowest_frequency * 2f32.powf(semitones / 12.0)
    }

    /// Analysis windows per second at the given sample rate
    pub fn windows_per_second(&self, sample_rate: u32) -> f32 {
        if self.block_size == 0 {
            return 0.0;
        }
        sample_rate as f32 / self.block_size as f32
    }
}

/// Ring transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Frame slots in the audio → UI ring buffer
    /// Kept small on purpose: a slow consumer sees fresh frames, not a backlog.
    /// Default: 3
    pub capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { capacity: 3 }
    }
}
