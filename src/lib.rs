//! # imgclass
//!
//! Batch image classification against a half-precision inference accelerator.
//! Each image is decoded to 8-bit RGB, repacked into a zero-centered `f16`
//! tensor, pushed through the network, and reported as `<path>,<label>`.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! imgclass = "0.1"
//! ```
//!
//! ```rust,no_run
//! use imgclass::prelude::*;
//! use std::path::Path;
//!
//! let config = imgclass::config::load_config(None, None)?;
//! let categories = CategoryTable::from_config(&config.categories)?;
//! let mut backend = create_backend(&config.engine);
//!
//! let mut driver = BatchDriver::start(
//!     backend.as_mut(),
//!     &config.engine.weights_path,
//!     &categories,
//!     BatchPolicy { fail_fast: config.batch.fail_fast },
//! )?;
//! let report = driver.run(&[Path::new("cat.jpg")], &mut std::io::stdout())?;
//! println!("{} classified", report.results.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: imgclass-config, imgclass-observability    │
//! │  (TOML + env/CLI overrides, tracing setup)              │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Pipeline: imgclass-engine                              │
//! │  load → preprocess → infer → classify → emit            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Feature Flags
//!
//! - **`file-logging`**: also write JSON logs into a timestamped run folder
//!
//! ## License
//!
//! Apache-2.0

pub use imgclass_config as config;
pub use imgclass_engine as engine;
pub use imgclass_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::engine::{
        create_backend, BatchDriver, BatchPolicy, BatchReport, CategoryTable, ClassificationResult,
        InferenceBackend, PipelineError,
    };
    pub use crate::config::{BackendKind, ImgclassConfig};
}
