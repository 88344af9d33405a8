//! # Inference Backend Abstraction
//!
//! The accelerator is driven through one small trait so the pipeline can run
//! against real hardware, the CPU reference model, or a fixed-output stub
//! without changing the driver.
//!
//! Lifecycle: `initialize` → `load_weights` → `commit`, then any number of
//! `load_input` → `run` → `output` cycles reusing the same input region.

mod fixed;
mod reference;

pub use fixed::FixedBackend;
pub use reference::{ReferenceBackend, ReferenceWeights, WEIGHTS_MAGIC};

use std::path::{Path, PathBuf};

use imgclass_config::{BackendKind, EngineConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend has not been initialized")]
    NotInitialized,

    #[error("weights have not been loaded")]
    WeightsNotLoaded,

    #[error("network has not been committed")]
    NotCommitted,

    #[error("failed to read weights from {}: {source}", path.display())]
    WeightRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid weight blob: {0}")]
    InvalidWeights(String),

    #[error("input is {actual} bytes but the network expects {expected}")]
    InputSize { expected: usize, actual: usize },

    #[error("execution failed: {0}")]
    Execution(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Accelerator contract used by the batch driver
///
/// Only one input may be resident at a time; `&mut self` on `load_input` and
/// `run` keeps the copy-then-run sequence exclusive.
pub trait InferenceBackend: Send {
    /// Backend name for logging
    fn backend_name(&self) -> &str;

    /// Set up accelerator state
    fn initialize(&mut self) -> BackendResult<()>;

    /// Load the network weights from `path`
    fn load_weights(&mut self, path: &Path) -> BackendResult<()>;

    /// Finalize the network; fixes the input region and output width
    fn commit(&mut self) -> BackendResult<()>;

    /// Half-precision input elements accepted per run, once committed
    ///
    /// `None` means the backend accepts any input size.
    fn input_len(&self) -> Option<usize>;

    /// Scores produced per run, once committed
    fn output_len(&self) -> Option<usize>;

    /// The resident input region, `input_len() * 2` bytes
    fn input_region(&mut self) -> BackendResult<&mut [u8]>;

    /// Run one forward pass over the resident input
    fn run(&mut self) -> BackendResult<()>;

    /// Scores from the most recent `run`
    fn output(&self) -> BackendResult<&[f32]>;

    /// Copy a tensor into the input region byte-for-byte
    ///
    /// Default implementation rejects inputs whose size differs from the
    /// region instead of writing past it.
    fn load_input(&mut self, tensor: &[u8]) -> BackendResult<()> {
        let region = self.input_region()?;
        if region.len() != tensor.len() {
            return Err(BackendError::InputSize {
                expected: region.len(),
                actual: tensor.len(),
            });
        }
        region.copy_from_slice(tensor);
        Ok(())
    }
}

/// Construct the backend selected by configuration
pub fn create_backend(config: &EngineConfig) -> Box<dyn InferenceBackend> {
    match config.backend {
        BackendKind::Fixed => Box::new(FixedBackend::new(config.fixed_output.clone())),
        BackendKind::Reference => Box::new(ReferenceBackend::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_backend_matches_kind() {
        let mut config = EngineConfig::default();
        assert_eq!(create_backend(&config).backend_name(), "reference (CPU)");

        config.backend = BackendKind::Fixed;
        config.fixed_output = vec![1.0];
        assert_eq!(create_backend(&config).backend_name(), "fixed");
    }

    #[test]
    fn test_load_input_rejects_size_mismatch() {
        let mut backend = FixedBackend::new(vec![1.0]).with_input_len(4);
        backend.initialize().unwrap();
        backend.load_weights(Path::new("unused.bin")).unwrap();
        backend.commit().unwrap();

        let err = backend.load_input(&[0u8; 6]).unwrap_err();
        assert!(matches!(err, BackendError::InputSize { expected: 8, actual: 6 }));
        assert!(backend.load_input(&[0u8; 8]).is_ok());
    }
}
