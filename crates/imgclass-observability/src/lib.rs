// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # imgclass-observability
//!
//! Diagnostic logging for the classification pipeline.
//!
//! Results are the only thing the binary writes to stdout, so every
//! subscriber built here writes to stderr (and optionally a log file).
//!
//! ## Features
//! - `file-logging`: additionally append logs to a timestamped run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "imgclass-engine",
    "imgclass-config",
    "imgclass-observability",
];
