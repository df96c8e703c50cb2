//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Practice settings
    #[serde(default)]
    pub practice: RawPracticeConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path (default: XDG runtime dir)
    pub socket_path: Option<PathBuf>,

    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// Log directory
    pub log_dir: Option<PathBuf>,
}

/// Practice settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPracticeConfig {
    /// Business locations sessions are recorded against
    #[serde(default)]
    pub locations: Vec<RawLocation>,
}

/// One business location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLocation {
    /// Stable key, matched against session `location` fields
    pub id: String,

    /// Display label (defaults to the id)
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_locations() {
        let toml_str = r#"
            config_version = 1

            [[practice.locations]]
            id = "soul-bridge"
            label = "Soul Bridge Wellness"

            [[practice.locations]]
            id = "halo"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.practice.locations.len(), 2);
        assert_eq!(config.practice.locations[0].id, "soul-bridge");
        assert!(config.practice.locations[1].label.is_none());
    }

    #[test]
    fn sections_default_when_absent() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.service.socket_path.is_none());
        assert!(config.practice.locations.is_empty());
    }
}
