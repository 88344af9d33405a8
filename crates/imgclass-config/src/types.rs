// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `imgclass.toml`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ConfigError;

/// Weight blob location used when the deployment does not override it
pub const DEFAULT_WEIGHTS_PATH: &str = "CaffeGoogLeNet/CaffeGoogLeNet_weights.bin";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImgclassConfig {
    pub engine: EngineConfig,
    pub categories: CategoriesConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

/// Inference backend variants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Stub that reports a configured output vector for every image
    Fixed,

    /// CPU reference model driven by a small linear weight blob
    #[default]
    Reference,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Fixed => write!(f, "fixed"),
            BackendKind::Reference => write!(f, "reference"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" | "stub" => Ok(BackendKind::Fixed),
            "reference" | "cpu" => Ok(BackendKind::Reference),
            _ => Err(ConfigError::InvalidValue(format!(
                "unknown backend '{}' (expected 'fixed' or 'reference')",
                s
            ))),
        }
    }
}

/// Inference backend configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub backend: BackendKind,
    pub weights_path: PathBuf,
    /// Scores reported by the fixed backend on every run
    pub fixed_output: Vec<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            fixed_output: Vec::new(),
        }
    }
}

/// Category table source
///
/// With neither field set the compiled-in ImageNet table is used.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CategoriesConfig {
    pub labels: Option<Vec<String>>,
    pub labels_file: Option<PathBuf>,
}

/// Per-image failure policy
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Stop the batch at the first image that fails
    pub fail_fast: bool,
}

/// Diagnostic logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
