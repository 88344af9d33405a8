//! Common test utilities and helpers

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imgclass_engine::{CategoryTable, ReferenceWeights};
use tempfile::TempDir;

/// Create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Write a uniform RGB PNG and return its path
pub fn write_solid_png(dir: &Path, name: &str, width: u32, height: u32, rgb: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb(rgb))
        .save(&path)
        .expect("Failed to write PNG fixture");
    path
}

/// Write a uniform gray PNG (all channels equal)
pub fn write_gray_png(dir: &Path, name: &str, width: u32, height: u32, value: u8) -> PathBuf {
    write_solid_png(dir, name, width, height, [value; 3])
}

/// The three-label table used throughout the pipeline tests
pub fn animal_categories() -> CategoryTable {
    CategoryTable::from_labels(["cat", "dog", "bird"]).expect("Failed to build category table")
}

/// Two-class reference network: "bright" scores the lane means, "dark" their negation
pub fn bright_dark_weights(width: u32, height: u32) -> ReferenceWeights {
    ReferenceWeights {
        input_width: width,
        input_height: height,
        weights: vec![1.0, 1.0, 1.0, -1.0, -1.0, -1.0],
        biases: vec![0.0, 0.0],
    }
}

/// Serialize reference weights into `dir` and return the blob path
pub fn write_weights(dir: &Path, name: &str, weights: &ReferenceWeights) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, weights.to_bytes()).expect("Failed to write weight blob");
    path
}

/// Split captured output into lines
pub fn output_lines(out: &[u8]) -> Vec<String> {
    String::from_utf8(out.to_vec())
        .expect("Output is not UTF-8")
        .lines()
        .map(str::to_string)
        .collect()
}
