//! Error taxonomy for the classification pipeline
//!
//! Fatal errors end the run before (or instead of) processing further images;
//! everything else is scoped to a single image and handled by the batch driver.

use std::path::PathBuf;

use thiserror::Error;

use crate::backend::BackendError;

/// Accelerator start-up phase that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    Initialize,
    LoadWeights,
    Commit,
}

impl std::fmt::Display for InitStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitStage::Initialize => write!(f, "initialize network"),
            InitStage::LoadWeights => write!(f, "load weights"),
            InitStage::Commit => write!(f, "commit network"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to {stage}: {source}")]
    FatalInit {
        stage: InitStage,
        #[source]
        source: BackendError,
    },

    #[error("failed to load an image from {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to allocate {elements} tensor elements")]
    Allocation {
        elements: usize,
        #[source]
        source: std::collections::TryReserveError,
    },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("category table has {categories} labels but the network produces {outputs} scores")]
    ConfigMismatch { categories: usize, outputs: usize },

    #[error("failed to write results: {0}")]
    Output(#[source] std::io::Error),
}

impl PipelineError {
    /// Whether this error ends the whole run rather than a single image
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::FatalInit { .. }
                | PipelineError::ConfigMismatch { .. }
                | PipelineError::Output(_)
        )
    }
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        PipelineError::Inference(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_classification() {
        let init = PipelineError::FatalInit {
            stage: InitStage::LoadWeights,
            source: BackendError::NotInitialized,
        };
        assert!(init.is_fatal());
        assert!(PipelineError::ConfigMismatch { categories: 3, outputs: 4 }.is_fatal());
        assert!(!PipelineError::Inference("device busy".to_string()).is_fatal());
    }

    #[test]
    fn test_init_message_names_stage() {
        let err = PipelineError::FatalInit {
            stage: InitStage::Commit,
            source: BackendError::NotInitialized,
        };
        assert!(err.to_string().starts_with("failed to commit network"));
    }
}
