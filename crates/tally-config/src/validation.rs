//! Configuration validation

use crate::schema::{RawConfig, RawLocation};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Location '{location_id}': {message}")]
    LocationError {
        location_id: String,
        message: String,
    },

    #[error("Duplicate location id: {0}")]
    DuplicateLocationId(String),

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.practice.locations.is_empty() {
        errors.push(ValidationError::GlobalError(
            "at least one practice location must be configured".into(),
        ));
    }

    // Check for duplicate location IDs
    let mut seen_ids = HashSet::new();
    for location in &config.practice.locations {
        if !seen_ids.insert(&location.id) {
            errors.push(ValidationError::DuplicateLocationId(location.id.clone()));
        }
    }

    // Validate each location
    for location in &config.practice.locations {
        errors.extend(validate_location(location));
    }

    errors
}

fn validate_location(location: &RawLocation) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if location.id.is_empty() {
        errors.push(ValidationError::LocationError {
            location_id: location.id.clone(),
            message: "id cannot be empty".into(),
        });
    } else if location.id.chars().any(char::is_whitespace) {
        // Location ids are matched verbatim against session records;
        // whitespace is always a typo.
        errors.push(ValidationError::LocationError {
            location_id: location.id.clone(),
            message: "id cannot contain whitespace".into(),
        });
    }

    if let Some(label) = &location.label {
        if label.trim().is_empty() {
            errors.push(ValidationError::LocationError {
                location_id: location.id.clone(),
                message: "label cannot be blank".into(),
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawPracticeConfig, RawServiceConfig};

    fn config_with(locations: Vec<RawLocation>) -> RawConfig {
        RawConfig {
            config_version: 1,
            service: RawServiceConfig::default(),
            practice: RawPracticeConfig { locations },
        }
    }

    #[test]
    fn accepts_valid_locations() {
        let config = config_with(vec![
            RawLocation {
                id: "soul-bridge".into(),
                label: Some("Soul Bridge Wellness".into()),
            },
            RawLocation {
                id: "halo".into(),
                label: None,
            },
        ]);

        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn rejects_empty_location_set() {
        let errors = validate_config(&config_with(vec![]));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::GlobalError(_))));
    }

    #[test]
    fn detects_duplicate_ids() {
        let config = config_with(vec![
            RawLocation {
                id: "halo".into(),
                label: None,
            },
            RawLocation {
                id: "halo".into(),
                label: Some("Halo Spa".into()),
            },
        ]);

        let errors = validate_config(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateLocationId(_))));
    }

    #[test]
    fn rejects_malformed_ids_and_labels() {
        let config = config_with(vec![
            RawLocation {
                id: "".into(),
                label: None,
            },
            RawLocation {
                id: "soul bridge".into(),
                label: None,
            },
            RawLocation {
                id: "halo".into(),
                label: Some("   ".into()),
            },
        ]);

        let errors = validate_config(&config);
        assert_eq!(
            errors
                .iter()
                .filter(|e| matches!(e, ValidationError::LocationError { .. }))
                .count(),
            3
        );
    }
}
