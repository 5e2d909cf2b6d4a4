//! YAML configuration I/O
//!
//! Generic loading and saving that works with any serializable
//! configuration type, so the library and each binary share one format.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read and parse a YAML configuration file, failing on any problem
///
/// Used when the user named the file explicitly: a typo in a path given on
/// the command line should stop the program, not silently fall back.
pub fn try_load_config<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    log::info!("Loaded config from {:?}", path);
    Ok(config)
}

/// Load configuration from a YAML file, falling back to defaults
///
/// A missing file yields the default configuration. An unreadable or
/// unparsable file is logged and also yields the default, so a broken
/// config at the default location never keeps the microphone from starting.
///
/// ```ignore
/// let config: HarmonyConfig = load_config(&default_config_path());
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("No config at {:?}, using defaults", path);
        return T::default();
    }

    try_load_config(path).unwrap_or_else(|e| {
        log::warn!("{:#}, using defaults", e);
        T::default()
    })
}

/// Save configuration to a YAML file, creating parent directories
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("Saved config to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarmonyConfig;

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config: HarmonyConfig = load_config(Path::new("/nonexistent/harmony/config.yaml"));
        assert_eq!(config, HarmonyConfig::default());
    }

    #[test]
    fn test_invalid_yaml_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "tracker: [not, a, map").unwrap();

        let config: HarmonyConfig = load_config(&path);
        assert_eq!(config, HarmonyConfig::default());
    }

    #[test]
    fn test_strict_load_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        let err = try_load_config::<HarmonyConfig>(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "transport: {capacity: many}").unwrap();
        let err = try_load_config::<HarmonyConfig>(&broken).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "tracker:\n  min_duration: 3\n").unwrap();

        let config: HarmonyConfig = try_load_config(&path).unwrap();
        assert_eq!(config.tracker.min_duration, 3);
        assert_eq!(config.tracker.expiry, 10);
        assert_eq!(config.transport, HarmonyConfig::default().transport);
    }

    #[test]
    fn test_roundtrip_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = HarmonyConfig::default();
        config.tracker.expiry = 16;
        config.transport.capacity = 8;

        save_config(&config, &path).unwrap();
        let loaded: HarmonyConfig = load_config(&path);

        assert_eq!(loaded.tracker.expiry, 16);
        assert_eq!(loaded.transport.capacity, 8);
        assert_eq!(loaded.analysis, config.analysis);
    }
}
