//! # CPU Reference Backend
//!
//! Workstation stand-in for the accelerator. The network is a global average
//! pool over the three channel lanes of the input tensor (`index % 3`)
//! followed by a linear head. Input size and class count come from the weight
//! blob.
//!
//! Weight blob layout (little-endian):
//!
//! | offset | field                                   |
//! |--------|-----------------------------------------|
//! | 0      | magic `ICW1`                            |
//! | 4      | input width (u32)                       |
//! | 8      | input height (u32)                      |
//! | 12     | class count `n` (u32)                   |
//! | 16     | `n * 3` weights (f32, class-major)      |
//! | ...    | `n` biases (f32)                        |

use std::fs;
use std::path::Path;

use half::f16;
use tracing::{debug, info};

use super::{BackendError, BackendResult, InferenceBackend};
use crate::preprocess::CHANNELS;

/// Leading bytes of every reference weight blob
pub const WEIGHTS_MAGIC: &[u8; 4] = b"ICW1";

const HEADER_LEN: usize = 16;

/// Parsed reference network parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceWeights {
    pub input_width: u32,
    pub input_height: u32,
    /// `classes * 3` values, class-major
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
}

impl ReferenceWeights {
    pub fn classes(&self) -> usize {
        self.biases.len()
    }

    /// Half-precision elements in one input tensor
    pub fn input_len(&self) -> usize {
        self.input_width as usize * self.input_height as usize * CHANNELS
    }

    pub fn parse(bytes: &[u8]) -> BackendResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(BackendError::InvalidWeights(format!(
                "blob is {} bytes, shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }
        if &bytes[0..4] != WEIGHTS_MAGIC {
            return Err(BackendError::InvalidWeights("bad magic".to_string()));
        }

        let read_u32 = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };
        let input_width = read_u32(4);
        let input_height = read_u32(8);
        let classes = read_u32(12) as usize;

        if input_width == 0 || input_height == 0 || classes == 0 {
            return Err(BackendError::InvalidWeights(format!(
                "degenerate shape {}x{} with {} classes",
                input_width, input_height, classes
            )));
        }

        let expected = HEADER_LEN + classes * (CHANNELS + 1) * 4;
        if bytes.len() != expected {
            return Err(BackendError::InvalidWeights(format!(
                "expected {} bytes for {} classes, found {}",
                expected,
                classes,
                bytes.len()
            )));
        }

        let mut values = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]));
        let weights: Vec<f32> = values.by_ref().take(classes * CHANNELS).collect();
        let biases: Vec<f32> = values.collect();

        if weights.iter().chain(&biases).any(|v| !v.is_finite()) {
            return Err(BackendError::InvalidWeights("non-finite parameter".to_string()));
        }

        Ok(Self {
            input_width,
            input_height,
            weights,
            biases,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + (self.weights.len() + self.biases.len()) * 4);
        bytes.extend_from_slice(WEIGHTS_MAGIC);
        bytes.extend_from_slice(&self.input_width.to_le_bytes());
        bytes.extend_from_slice(&self.input_height.to_le_bytes());
        bytes.extend_from_slice(&(self.classes() as u32).to_le_bytes());
        for value in self.weights.iter().chain(&self.biases) {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Scores for one input
    fn forward(&self, input: &[f16]) -> Vec<f32> {
        let mut sums = [0.0f64; CHANNELS];
        for (i, value) in input.iter().enumerate() {
            sums[i % CHANNELS] += value.to_f64();
        }
        let per_lane = (input.len() / CHANNELS).max(1) as f64;
        let means = sums.map(|sum| (sum / per_lane) as f32);

        self.biases
            .iter()
            .enumerate()
            .map(|(class, bias)| {
                let row = &self.weights[class * CHANNELS..(class + 1) * CHANNELS];
                bias + row.iter().zip(means.iter()).map(|(w, m)| w * m).sum::<f32>()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Created,
    Initialized,
    Loaded,
    Committed,
}

pub struct ReferenceBackend {
    stage: Stage,
    weights: Option<ReferenceWeights>,
    input: Vec<f16>,
    output: Vec<f32>,
}

impl ReferenceBackend {
    pub fn new() -> Self {
        Self {
            stage: Stage::Created,
            weights: None,
            input: Vec::new(),
            output: Vec::new(),
        }
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

impl Default for ReferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for ReferenceBackend {
    fn backend_name(&self) -> &str {
        "reference (CPU)"
    }

    fn initialize(&mut self) -> BackendResult<()> {
        self.weights = None;
        self.input.clear();
        self.output.clear();
        self.stage = Stage::Initialized;
        Ok(())
    }

    fn load_weights(&mut self, path: &Path) -> BackendResult<()> {
        self.require(Stage::Initialized)?;
        let bytes = fs::read(path).map_err(|source| BackendError::WeightRead {
            path: path.to_path_buf(),
            source,
        })?;
        let weights = ReferenceWeights::parse(&bytes)?;
        debug!(
            "Loaded reference weights from {}: {}x{} input, {} classes",
            path.display(),
            weights.input_width,
            weights.input_height,
            weights.classes()
        );
        self.weights = Some(weights);
        self.stage = Stage::Loaded;
        Ok(())
    }

    fn commit(&mut self) -> BackendResult<()> {
        self.require(Stage::Loaded)?;
        let weights = self.weights.as_ref().ok_or(BackendError::WeightsNotLoaded)?;
        self.input = vec![f16::ZERO; weights.input_len()];
        self.output = vec![0.0; weights.classes()];
        info!(
            "Reference network committed ({} input elements, {} outputs)",
            self.input.len(),
            self.output.len()
        );
        self.stage = Stage::Committed;
        Ok(())
    }

    fn input_len(&self) -> Option<usize> {
        self.weights.as_ref().map(ReferenceWeights::input_len)
    }

    fn output_len(&self) -> Option<usize> {
        self.weights.as_ref().map(ReferenceWeights::classes)
    }

    fn input_region(&mut self) -> BackendResult<&mut [u8]> {
        self.require(Stage::Committed)?;
        Ok(bytemuck::cast_slice_mut(&mut self.input))
    }

    fn run(&mut self) -> BackendResult<()> {
        self.require(Stage::Committed)?;
        let weights = self.weights.as_ref().ok_or(BackendError::WeightsNotLoaded)?;
        let scores = weights.forward(&self.input);
        if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
            return Err(BackendError::Execution(format!(
                "non-finite score for class {}",
                bad
            )));
        }
        self.output = scores;
        Ok(())
    }

    fn output(&self) -> BackendResult<&[f32]> {
        self.require(Stage::Committed)?;
        Ok(&self.output)
    }
}
