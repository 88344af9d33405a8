//! # Fixed-Output Backend
//!
//! Stand-in accelerator that reports the same score vector for every input.
//! Useful for dry runs of the pipeline and for tests; it can also be told to
//! fail specific runs.

use std::path::Path;

use tracing::debug;

use super::{BackendError, BackendResult, InferenceBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Created,
    Initialized,
    Loaded,
    Committed,
}

pub struct FixedBackend {
    stage: Stage,
    scores: Vec<f32>,
    /// Bytes expected per input; `None` accepts any size
    input_bytes: Option<usize>,
    input: Vec<u8>,
    output: Vec<f32>,
    runs: usize,
    failing_runs: Vec<usize>,
    last_input: Vec<u8>,
}

impl FixedBackend {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            stage: Stage::Created,
            scores,
            input_bytes: None,
            input: Vec::new(),
            output: Vec::new(),
            runs: 0,
            failing_runs: Vec::new(),
            last_input: Vec::new(),
        }
    }

    /// Require inputs of exactly `elements` half-precision values
    pub fn with_input_len(mut self, elements: usize) -> Self {
        self.input_bytes = Some(elements * 2);
        self
    }

    /// Make the given zero-based runs fail with an execution error
    pub fn with_failing_runs(mut self, runs: impl IntoIterator<Item = usize>) -> Self {
        self.failing_runs = runs.into_iter().collect();
        self
    }

    /// Number of `run` calls so far, including failed ones
    pub fn run_count(&self) -> usize {
        self.runs
    }

    /// Input bytes seen by the most recent successful `run`
    pub fn last_input(&self) -> &[u8] {
        &self.last_input
    }

    fn require(&self, stage: Stage) -> BackendResult<()> {
        if self.stage == stage {
            return Ok(());
        }
        Err(match self.stage {
            Stage::Created => BackendError::NotInitialized,
            Stage::Initialized => BackendError::WeightsNotLoaded,
            _ => BackendError::NotCommitted,
        })
    }
}

impl InferenceBackend for FixedBackend {
    fn backend_name(&self) -> &str {
        "fixed"
    }

    fn initialize(&mut self) -> BackendResult<()> {
        self.stage = Stage::Initialized;
        Ok(())
    }

    fn load_weights(&mut self, path: &Path) -> BackendResult<()> {
        self.require(Stage::Initialized)?;
        debug!("Fixed backend ignores weights at {}", path.display());
        self.stage = Stage::Loaded;
        Ok(())
    }

    fn commit(&mut self) -> BackendResult<()> {
        self.require(Stage::Loaded)?;
        self.input = vec![0; self.input_bytes.unwrap_or(0)];
        self.stage = Stage::Committed;
        Ok(())
    }

    fn input_len(&self) -> Option<usize> {
        self.input_bytes.map(|bytes| bytes / 2)
    }

    fn output_len(&self) -> Option<usize> {
        (self.stage == Stage::Committed).then_some(self.scores.len())
    }

    fn input_region(&mut self) -> BackendResult<&mut [u8]> {
        self.require(Stage::Committed)?;
        Ok(&mut self.input)
    }

    fn load_input(&mut self, tensor: &[u8]) -> BackendResult<()> {
        self.require(Stage::Committed)?;
        match self.input_bytes {
            Some(expected) if expected != tensor.len() => Err(BackendError::InputSize {
                expected,
                actual: tensor.len(),
            }),
            _ => {
                self.input.clear();
                self.input.extend_from_slice(tensor);
                Ok(())
            }
        }
    }

    fn run(&mut self) -> BackendResult<()> {
        self.require(Stage::Committed)?;
        let run = self.runs;
        self.runs += 1;
        if self.failing_runs.contains(&run) {
            return Err(BackendError::Execution(format!("injected failure on run {}", run)));
        }
        self.last_input.clone_from(&self.input);
        self.output.clone_from(&self.scores);
        Ok(())
    }

    fn output(&self) -> BackendResult<&[f32]> {
        self.require(Stage::Committed)?;
        Ok(&self.output)
    }
}
