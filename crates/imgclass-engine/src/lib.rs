//! Image classification pipeline
//!
//! Decodes images to 8-bit RGB rasters, repacks them into zero-centered
//! half-precision tensors, runs them through an [`InferenceBackend`], and maps
//! the winning output index to a category label.
//!
//! ```no_run
//! use std::path::Path;
//! use imgclass_engine::{BatchDriver, BatchPolicy, CategoryTable, ReferenceBackend};
//!
//! let categories = CategoryTable::imagenet();
//! let mut backend = ReferenceBackend::new();
//! let mut driver = BatchDriver::start(
//!     &mut backend,
//!     Path::new("weights.bin"),
//!     &categories,
//!     BatchPolicy::default(),
//! )?;
//! let report = driver.run(&["cat.jpg"], &mut std::io::stdout())?;
//! assert!(report.is_success());
//! # Ok::<(), imgclass_engine::PipelineError>(())
//! ```

pub mod backend;
pub mod categories;
pub mod classifier;
pub mod driver;
pub mod error;
pub mod image_loader;
pub mod preprocess;

// Re-export key types for convenience
pub use backend::{
    create_backend, BackendError, FixedBackend, InferenceBackend, ReferenceBackend, ReferenceWeights,
};
pub use categories::CategoryTable;
pub use classifier::{argmax, Classifier, Prediction};
pub use driver::{BatchDriver, BatchPolicy, BatchReport, ClassificationResult, ImageFailure};
pub use error::{InitStage, PipelineError, Result};
pub use image_loader::{load_raster, RasterImage};
pub use preprocess::{preprocess, InputTensor};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
