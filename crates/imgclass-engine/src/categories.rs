//! Output index to label mapping
//!
//! Built once at start-up and shared by reference for the rest of the run.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use imgclass_config::CategoriesConfig;

/// ImageNet-1000 labels, one per line, in network output order
const IMAGENET_1000: &str = include_str!("../assets/imagenet_1000_categories.txt");

/// Immutable ordered label list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    labels: Vec<String>,
}

impl CategoryTable {
    /// The compiled-in ImageNet-1000 table
    pub fn imagenet() -> Self {
        Self {
            labels: parse_lines(IMAGENET_1000),
        }
    }

    /// Build a table from an explicit label list
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            bail!("category table must contain at least one label");
        }
        Ok(Self { labels })
    }

    /// Read a table from a text file with one label per line
    ///
    /// Blank lines are skipped; surrounding whitespace is trimmed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read category file: {}", path.display()))?;
        Self::from_labels(parse_lines(&content))
            .with_context(|| format!("Category file {} has no labels", path.display()))
    }

    /// Resolve the table selected by configuration
    pub fn from_config(config: &CategoriesConfig) -> Result<Self> {
        match (&config.labels, &config.labels_file) {
            (Some(labels), None) => Self::from_labels(labels.iter().cloned()),
            (None, Some(path)) => Self::from_file(path),
            (None, None) => Ok(Self::imagenet()),
            (Some(_), Some(_)) => bail!("categories.labels and categories.labels_file are mutually exclusive"),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at `index`, if it exists
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
