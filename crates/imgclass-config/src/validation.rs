// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures configuration values are consistent with the selected backend and
//! category source before any accelerator state is created.

use crate::{BackendKind, ConfigError, ConfigResult, ImgclassConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    Conflict { first: String, second: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::Conflict { first, second } => {
                write!(f, "{} and {} cannot both be set", first, second)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Backend-specific required fields
/// - Conflicting category sources
/// - Valid log level
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &ImgclassConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

/// Collect every validation problem without failing on the first one
pub fn collect_errors(config: &ImgclassConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_engine(config, &mut errors);
    validate_categories(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_engine(config: &ImgclassConfig, errors: &mut Vec<ConfigValidationError>) {
    match config.engine.backend {
        BackendKind::Fixed => {
            if config.engine.fixed_output.is_empty() {
                errors.push(ConfigValidationError::MissingRequired {
                    field: "engine.fixed_output".to_string(),
                });
            }
            if config.engine.fixed_output.iter().any(|v| !v.is_finite()) {
                errors.push(ConfigValidationError::InvalidValue {
                    field: "engine.fixed_output".to_string(),
                    reason: "scores must be finite".to_string(),
                });
            }
        }
        BackendKind::Reference => {
            if config.engine.weights_path.as_os_str().is_empty() {
                errors.push(ConfigValidationError::MissingRequired {
                    field: "engine.weights_path".to_string(),
                });
            }
        }
    }
}

fn validate_categories(config: &ImgclassConfig, errors: &mut Vec<ConfigValidationError>) {
    let categories = &config.categories;
    if categories.labels.is_some() && categories.labels_file.is_some() {
        errors.push(ConfigValidationError::Conflict {
            first: "categories.labels".to_string(),
            second: "categories.labels_file".to_string(),
        });
    }
    if let Some(labels) = &categories.labels {
        if labels.is_empty() {
            errors.push(ConfigValidationError::InvalidValue {
                field: "categories.labels".to_string(),
                reason: "label list is empty".to_string(),
            });
        }
    }
}

fn validate_logging(config: &ImgclassConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("'{}' is not one of {}", config.logging.level, LOG_LEVELS.join(", ")),
        });
    }
}
