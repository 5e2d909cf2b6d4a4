//! Configuration for harmony sessions
//!
//! - Generic YAML config loading/saving
//! - Standard config paths
//! - Tracker, analysis and transport tunables
//!
//! # Usage
//!
//! ```ignore
//! use harmony_core::config::{default_config_path, load_config, HarmonyConfig};
//!
//! let config: HarmonyConfig = load_config(&default_config_path());
//! ```

mod io;
mod paths;
mod tracking;

use serde::{Deserialize, Serialize};

use crate::audio::AudioConfig;

pub use io::{load_config, save_config, try_load_config};
pub use paths::{default_config_dir, default_config_path};
pub use tracking::{AnalysisConfig, TrackerConfig, TransportConfig, DEFAULT_LOWEST_FREQUENCY};

/// Everything a session needs, one section per subsystem
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonyConfig {
    /// Microphone selection and stream settings
    pub audio: AudioConfig,
    /// Extraction window settings
    pub analysis: AnalysisConfig,
    /// Candidate tracker tunables
    pub tracker: TrackerConfig,
    /// Audio → UI ring buffer settings
    pub transport: TransportConfig,
}
