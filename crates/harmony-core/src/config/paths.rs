//! Standard locations of Harmony configuration files

use std::path::PathBuf;

/// Directory holding Harmony configuration
///
/// Returns: `~/.config/harmony` (platform equivalent elsewhere)
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("harmony")
}

/// Default path of the main configuration file
///
/// Returns: `~/.config/harmony/config.yaml`
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_inside_config_dir() {
        let path = default_config_path();
        assert!(path.ends_with("harmony/config.yaml"));
        assert!(path.starts_with(default_config_dir()));
    }
}
