//! Output vector reduction
//!
//! Picks the highest-scoring category and resolves its label.

use crate::categories::CategoryTable;
use crate::error::{PipelineError, Result};

/// Index of the largest score, first occurrence winning ties
///
/// The running maximum starts at the most negative finite `f32`, and only a
/// strictly greater score replaces it. Returns `None` for an empty vector, or
/// when no score beats the initial value (all NaN or `-inf`).
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best = f32::MIN;
    let mut best_index = None;
    for (i, &score) in scores.iter().enumerate() {
        if best < score {
            best = score;
            best_index = Some(i);
        }
    }
    best_index
}

/// A winning category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction<'a> {
    pub index: usize,
    pub label: &'a str,
    pub score: f32,
}

/// Maps output vectors to labels through a borrowed category table
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    categories: &'a CategoryTable,
}

impl<'a> Classifier<'a> {
    pub fn new(categories: &'a CategoryTable) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &'a CategoryTable {
        self.categories
    }

    /// Check that the network's output width matches the table
    pub fn check_output_width(&self, outputs: usize) -> Result<()> {
        if outputs != self.categories.len() {
            return Err(PipelineError::ConfigMismatch {
                categories: self.categories.len(),
                outputs,
            });
        }
        Ok(())
    }

    /// Classify one output vector
    ///
    /// # Errors
    ///
    /// - `Inference` when no category can be selected (empty vector); the
    ///   label table is not consulted in that case.
    /// - `ConfigMismatch` when the winning index is outside the table.
    pub fn classify(&self, scores: &[f32]) -> Result<Prediction<'a>> {
        let index = argmax(scores).ok_or_else(|| {
            PipelineError::Inference(format!(
                "no valid category in an output vector of {} scores",
                scores.len()
            ))
        })?;

        let label = self
            .categories
            .label(index)
            .ok_or(PipelineError::ConfigMismatch {
                categories: self.categories.len(),
                outputs: scores.len(),
            })?;

        Ok(Prediction {
            index,
            label,
            score: scores[index],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animals() -> CategoryTable {
        CategoryTable::from_labels(["cat", "dog", "bird"]).unwrap()
    }

    #[test]
    fn test_argmax_first_maximum_wins() {
        assert_eq!(argmax(&[0.2, 0.9, 0.9, 0.1]), Some(1));
    }

    #[test]
    fn test_argmax_empty() {
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_argmax_negative_scores() {
        assert_eq!(argmax(&[-3.0, -1.5, -2.0]), Some(1));
    }

    #[test]
    fn test_argmax_skips_nan() {
        assert_eq!(argmax(&[f32::NAN, 0.3, f32::NAN]), Some(1));
        assert_eq!(argmax(&[f32::NAN]), None);
    }

    #[test]
    fn test_classify_picks_label() {
        let table = animals();
        let classifier = Classifier::new(&table);

        let prediction = classifier.classify(&[0.1, 0.5, 0.3]).unwrap();
        assert_eq!(prediction.index, 1);
        assert_eq!(prediction.label, "dog");
        assert_eq!(prediction.score, 0.5);
    }

    #[test]
    fn test_classify_empty_is_not_fatal() {
        let table = animals();
        let err = Classifier::new(&table).classify(&[]).unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_classify_index_beyond_table_is_fatal() {
        let table = animals();
        let err = Classifier::new(&table)
            .classify(&[0.0, 0.0, 0.0, 1.0])
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ConfigMismatch { categories: 3, outputs: 4 }
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_check_output_width() {
        let table = animals();
        let classifier = Classifier::new(&table);
        assert!(classifier.check_output_width(3).is_ok());
        assert!(classifier.check_output_width(1000).is_err());
    }
}
