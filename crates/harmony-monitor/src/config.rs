//! Monitor configuration
//!
//! Shares the file with the core session settings so one
//! `~/.config/harmony/config.yaml` drives both. The monitor only adds its
//! own `display` section.

use serde::{Deserialize, Serialize};

use harmony_core::config::HarmonyConfig;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Session settings (audio, analysis, tracker, transport)
    #[serde(flatten)]
    pub session: HarmonyConfig,
    /// Terminal output settings
    pub display: DisplayConfig,
}

/// Display configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Consumer polls per second
    pub tick_hz: u32,
    /// Print the frame counters every N seconds (0 = never)
    pub stats_interval_secs: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            stats_interval_secs: 5,
        }
    }
}

impl DisplayConfig {
    /// Time between two consumer polls
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(1) / self.tick_hz.clamp(1, 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony_core::config::{load_config, save_config};

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.display.tick_hz, 60);
        assert_eq!(config.session.transport.capacity, 3);
        assert_eq!(config.display.tick_interval().as_micros(), 16_666);
    }

    #[test]
    fn test_zero_tick_rate_is_clamped() {
        let display = DisplayConfig {
            tick_hz: 0,
            ..DisplayConfig::default()
        };
        assert_eq!(display.tick_interval(), std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_sections_share_one_file() {
        let yaml = "tracker:\n  expiry: 20\ndisplay:\n  tick_hz: 30\n";
        let config: MonitorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.session.tracker.expiry, 20);
        assert_eq!(config.session.tracker.min_duration, 2);
        assert_eq!(config.display.tick_hz, 30);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harmony").join("config.yaml");

        let mut config = MonitorConfig::default();
        config.session.transport.capacity = 8;
        config.display.tick_hz = 120;
        save_config(&config, &path).unwrap();

        let loaded: MonitorConfig = load_config(&path);
        assert_eq!(loaded, config);
    }
}
