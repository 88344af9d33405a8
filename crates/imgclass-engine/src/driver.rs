//! Batch driver
//!
//! Brings the backend up once, then runs every image through
//! load → preprocess → infer → classify → emit, strictly one at a time and in
//! input order. Per-image failures are logged and skipped (or end the batch
//! under the fail-fast policy); fatal errors abort the run.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::backend::InferenceBackend;
use crate::categories::CategoryTable;
use crate::classifier::{Classifier, Prediction};
use crate::error::{InitStage, PipelineError, Result};
use crate::image_loader::load_raster;
use crate::preprocess::{preprocess, InputTensor};

/// What to do after an image fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Stop at the first failed image instead of continuing
    pub fail_fast: bool,
}

/// One emitted classification
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub path: PathBuf,
    pub index: usize,
    pub label: String,
    pub score: f32,
}

impl ClassificationResult {
    fn new(path: &Path, prediction: Prediction<'_>) -> Self {
        Self {
            path: path.to_path_buf(),
            index: prediction.index,
            label: prediction.label.to_string(),
            score: prediction.score,
        }
    }
}

/// Renders the output line `<path>,<label>`
impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.path.display(), self.label)
    }
}

/// An image that was skipped
#[derive(Debug)]
pub struct ImageFailure {
    pub path: PathBuf,
    pub error: PipelineError,
}

/// Outcome of a batch
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successful classifications, in input order
    pub results: Vec<ClassificationResult>,
    /// Failed images, in input order
    pub failures: Vec<ImageFailure>,
    /// Images never attempted because the batch stopped early
    pub skipped: usize,
}

impl BatchReport {
    /// True only if every supplied image was classified
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }

    pub fn processed(&self) -> usize {
        self.results.len() + self.failures.len()
    }
}

/// Drives a committed backend over a list of images
pub struct BatchDriver<'a, B: InferenceBackend + ?Sized> {
    backend: &'a mut B,
    classifier: Classifier<'a>,
    policy: BatchPolicy,
}

impl<'a, B: InferenceBackend + ?Sized> BatchDriver<'a, B> {
    /// Initialize the backend, load weights, commit, and check the output
    /// width against the category table
    ///
    /// # Errors
    ///
    /// `FatalInit` for any backend start-up failure, `ConfigMismatch` when the
    /// committed output width differs from the table size.
    pub fn start(
        backend: &'a mut B,
        weights_path: &Path,
        categories: &'a CategoryTable,
        policy: BatchPolicy,
    ) -> Result<Self> {
        info!("Initializing backend: {}", backend.backend_name());
        backend
            .initialize()
            .map_err(|source| PipelineError::FatalInit {
                stage: InitStage::Initialize,
                source,
            })?;

        info!("Loading weights from: {}", weights_path.display());
        backend
            .load_weights(weights_path)
            .map_err(|source| PipelineError::FatalInit {
                stage: InitStage::LoadWeights,
                source,
            })?;

        backend.commit().map_err(|source| PipelineError::FatalInit {
            stage: InitStage::Commit,
            source,
        })?;

        let classifier = Classifier::new(categories);
        match backend.output_len() {
            Some(outputs) => classifier.check_output_width(outputs)?,
            None => warn!("Backend did not report its output width; checking per image"),
        }

        let width = |len: Option<usize>| len.map_or_else(|| "any".to_string(), |n| n.to_string());
        info!(
            "Network ready: {} input elements, {} outputs, {} categories",
            width(backend.input_len()),
            width(backend.output_len()),
            categories.len()
        );

        Ok(Self {
            backend,
            classifier,
            policy,
        })
    }

    /// Copy a tensor into the backend, run it, and classify the output
    pub fn infer(&mut self, tensor: &InputTensor) -> Result<Prediction<'a>> {
        self.backend.load_input(tensor.as_bytes())?;
        self.backend.run()?;
        let scores = self.backend.output()?;
        self.classifier.classify(scores)
    }

    /// Run one image through every stage
    pub fn classify_image(&mut self, path: &Path) -> Result<ClassificationResult> {
        let raster = load_raster(path)?;
        let tensor = preprocess(&raster)?;
        drop(raster);

        let prediction = self.infer(&tensor)?;
        debug!(
            "{} -> #{} {} ({:.4})",
            path.display(),
            prediction.index,
            prediction.label,
            prediction.score
        );
        Ok(ClassificationResult::new(path, prediction))
    }

    /// Classify every path, writing one line per success to `out`
    ///
    /// Lines are written as soon as each image completes, in input order.
    ///
    /// # Errors
    ///
    /// Only fatal errors (configuration mismatch, unwritable output) are
    /// returned; everything else is recorded in the report.
    pub fn run<P, W>(&mut self, paths: &[P], out: &mut W) -> Result<BatchReport>
    where
        P: AsRef<Path>,
        W: Write,
    {
        let mut report = BatchReport::default();

        for (position, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            match self.classify_image(path) {
                Ok(result) => {
                    writeln!(out, "{}", result).map_err(PipelineError::Output)?;
                    report.results.push(result);
                }
                Err(err) if err.is_fatal() => {
                    error!("Aborting batch at {}: {}", path.display(), err);
                    return Err(err);
                }
                Err(err) => {
                    error!("Skipping {}: {}", path.display(), err);
                    report.failures.push(ImageFailure {
                        path: path.to_path_buf(),
                        error: err,
                    });
                    if self.policy.fail_fast {
                        report.skipped = paths.len() - position - 1;
                        warn!("Fail-fast enabled; {} image(s) not processed", report.skipped);
                        break;
                    }
                }
            }
        }

        out.flush().map_err(PipelineError::Output)?;

        info!(
            "Batch complete: {} classified, {} failed, {} not processed",
            report.results.len(),
            report.failures.len(),
            report.skipped
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, FixedBackend};

    /// Accepts a 1x1 tensor but never produces scores
    #[derive(Default)]
    struct BrokenBackend {
        fail_stage: Option<InitStage>,
        input: [u8; 6],
    }

    impl InferenceBackend for BrokenBackend {
        fn backend_name(&self) -> &str {
            "broken"
        }
        fn initialize(&mut self) -> crate::backend::BackendResult<()> {
            match self.fail_stage {
                Some(InitStage::Initialize) => Err(BackendError::Execution("no device".into())),
                _ => Ok(()),
            }
        }
        fn load_weights(&mut self, path: &Path) -> crate::backend::BackendResult<()> {
            match self.fail_stage {
                Some(InitStage::LoadWeights) => Err(BackendError::WeightRead {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }),
                _ => Ok(()),
            }
        }
        fn commit(&mut self) -> crate::backend::BackendResult<()> {
            match self.fail_stage {
                Some(InitStage::Commit) => Err(BackendError::Execution("graph rejected".into())),
                _ => Ok(()),
            }
        }
        fn input_len(&self) -> Option<usize> {
            None
        }
        fn output_len(&self) -> Option<usize> {
            Some(2)
        }
        fn input_region(&mut self) -> crate::backend::BackendResult<&mut [u8]> {
            Ok(&mut self.input)
        }
        fn run(&mut self) -> crate::backend::BackendResult<()> {
            Ok(())
        }
        fn output(&self) -> crate::backend::BackendResult<&[f32]> {
            Ok(&[])
        }
    }

    fn animals() -> CategoryTable {
        CategoryTable::from_labels(["cat", "dog", "bird"]).unwrap()
    }

    #[test]
    fn test_each_init_stage_is_fatal() {
        let table = CategoryTable::from_labels(["a", "b"]).unwrap();
        for stage in [InitStage::Initialize, InitStage::LoadWeights, InitStage::Commit] {
            let mut backend = BrokenBackend {
                fail_stage: Some(stage),
                ..Default::default()
            };
            let err = BatchDriver::start(&mut backend, Path::new("w.bin"), &table, BatchPolicy::default())
                .err()
                .unwrap();
            match err {
                PipelineError::FatalInit { stage: failed, .. } => assert_eq!(failed, stage),
                other => panic!("expected FatalInit, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_output_width_mismatch_detected_at_start() {
        let table = animals();
        let mut backend = FixedBackend::new(vec![0.1, 0.2]);
        let err = BatchDriver::start(&mut backend, Path::new("w.bin"), &table, BatchPolicy::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            PipelineError::ConfigMismatch { categories: 3, outputs: 2 }
        ));
    }

    #[test]
    fn test_infer_gray_tensor() {
        let table = animals();
        let mut backend = FixedBackend::new(vec![0.1, 0.5, 0.3]).with_input_len(12);
        let mut driver =
            BatchDriver::start(&mut backend, Path::new("w.bin"), &table, BatchPolicy::default())
                .unwrap();

        let raster = crate::RasterImage::filled(2, 2, 128);
        let tensor = preprocess(&raster).unwrap();
        let prediction = driver.infer(&tensor).unwrap();
        assert_eq!(prediction.label, "dog");
    }

    #[test]
    fn test_empty_output_is_per_image_failure() {
        let table = CategoryTable::from_labels(["a", "b"]).unwrap();
        let mut backend = BrokenBackend::default();
        let mut driver =
            BatchDriver::start(&mut backend, Path::new("w.bin"), &table, BatchPolicy::default())
                .unwrap();
        let tensor = preprocess(&crate::RasterImage::filled(1, 1, 0)).unwrap();
        let err = driver.infer(&tensor).unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_result_line_format() {
        let result = ClassificationResult {
            path: PathBuf::from("images/gray.png"),
            index: 1,
            label: "dog".to_string(),
            score: 0.5,
        };
        assert_eq!(result.to_string(), "images/gray.png,dog");
    }

    #[test]
    fn test_report_success_requires_no_failures_or_skips() {
        let mut report = BatchReport::default();
        assert!(report.is_success());
        report.skipped = 1;
        assert!(!report.is_success());
    }
}
