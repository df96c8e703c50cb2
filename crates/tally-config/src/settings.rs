//! Validated settings structures

use crate::schema::RawConfig;
use std::path::PathBuf;
use tally_util::{data_dir_without_env, default_log_dir, socket_path_without_env};

/// Validated settings ready for use by the service
#[derive(Debug, Clone)]
pub struct Settings {
    /// Service paths
    pub service: ServiceConfig,

    /// Known business locations, in configured order
    pub locations: Vec<Location>,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let locations = raw
            .practice
            .locations
            .into_iter()
            .map(|l| {
                let label = l.label.unwrap_or_else(|| l.id.clone());
                Location { id: l.id, label }
            })
            .collect();

        Self {
            service: ServiceConfig::from_raw(raw.service),
            locations,
        }
    }

    /// Look up a location by id
    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Display label for a location id, if configured
    pub fn location_label(&self, id: &str) -> Option<&str> {
        self.location(id).map(|l| l.label.as_str())
    }
}

/// Service path configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ServiceConfig {
    fn from_raw(raw: crate::schema::RawServiceConfig) -> Self {
        Self {
            socket_path: raw.socket_path.unwrap_or_else(socket_path_without_env),
            data_dir: raw.data_dir.unwrap_or_else(data_dir_without_env),
            log_dir: raw.log_dir.unwrap_or_else(default_log_dir),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            socket_path: socket_path_without_env(),
            data_dir: data_dir_without_env(),
            log_dir: default_log_dir(),
        }
    }
}

/// A validated business location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: String,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawLocation, RawPracticeConfig, RawServiceConfig};

    #[test]
    fn label_defaults_to_id() {
        let raw = RawConfig {
            config_version: 1,
            service: RawServiceConfig::default(),
            practice: RawPracticeConfig {
                locations: vec![
                    RawLocation {
                        id: "halo".into(),
                        label: None,
                    },
                    RawLocation {
                        id: "soul-bridge".into(),
                        label: Some("Soul Bridge Wellness".into()),
                    },
                ],
            },
        };

        let settings = Settings::from_raw(raw);
        assert_eq!(settings.location_label("halo"), Some("halo"));
        assert_eq!(
            settings.location_label("soul-bridge"),
            Some("Soul Bridge Wellness")
        );
        assert_eq!(settings.location_label("pop-up"), None);
    }

    #[test]
    fn service_paths_have_defaults() {
        let raw = RawConfig {
            config_version: 1,
            service: RawServiceConfig::default(),
            practice: RawPracticeConfig { locations: vec![] },
        };

        let settings = Settings::from_raw(raw);
        assert!(!settings.service.socket_path.as_os_str().is_empty());
        assert!(!settings.service.data_dir.as_os_str().is_empty());
    }
}
