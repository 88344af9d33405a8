// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{BackendKind, ConfigError, ConfigResult, ImgclassConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "imgclass.toml";

/// Find the imgclass configuration file
///
/// Search order:
/// 1. `IMGCLASS_CONFIG_PATH` environment variable
/// 2. Current working directory: `./imgclass.toml`
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if the environment variable points at a
/// missing file, or if no config file exists in any searched location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("IMGCLASS_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by IMGCLASS_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd;
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent.to_path_buf();
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet IMGCLASS_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is
///   searched for, and defaults are used when none is found.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns an error if an explicitly requested file is missing or unreadable,
/// if `IMGCLASS_CONFIG_PATH` points at a missing file, or if the TOML is invalid
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<ImgclassConfig> {
    let config_file = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => match find_config_file() {
            Ok(path) => Some(path),
            Err(ConfigError::FileNotFound(_)) if env::var("IMGCLASS_CONFIG_PATH").is_err() => None,
            Err(e) => return Err(e),
        },
    };

    let mut config = match config_file {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        None => ImgclassConfig::default(),
    };

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `IMGCLASS_BACKEND` -> `engine.backend`
/// - `IMGCLASS_WEIGHTS_PATH` -> `engine.weights_path`
/// - `IMGCLASS_FAIL_FAST` -> `batch.fail_fast`
/// - `IMGCLASS_LOG_LEVEL` -> `logging.level`
///
/// Unparseable values are ignored.
pub fn apply_environment_overrides(config: &mut ImgclassConfig) {
    if let Ok(value) = env::var("IMGCLASS_BACKEND") {
        if let Ok(kind) = value.parse::<BackendKind>() {
            config.engine.backend = kind;
        }
    }
    if let Ok(value) = env::var("IMGCLASS_WEIGHTS_PATH") {
        config.engine.weights_path = PathBuf::from(value);
    }
    if let Ok(value) = env::var("IMGCLASS_FAIL_FAST") {
        config.batch.fail_fast = parse_flag(&value);
    }
    if let Ok(value) = env::var("IMGCLASS_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// Recognized keys: `backend`, `fail_fast`, `log_level`. The weight path can
/// only come from the file or the environment.
pub fn apply_cli_overrides(config: &mut ImgclassConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("backend") {
        if let Ok(kind) = value.parse::<BackendKind>() {
            config.engine.backend = kind;
        }
    }
    if let Some(value) = cli_args.get("fail_fast") {
        config.batch.fail_fast = parse_flag(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}
