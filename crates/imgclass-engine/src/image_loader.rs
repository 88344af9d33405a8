//! Image file reader
//!
//! Decodes still images into a dense, interleaved RGB8 raster.

use std::path::Path;

use image::{DynamicImage, RgbImage};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Interleaved 8-bit RGB pixels with explicit dimensions
///
/// Always holds exactly `width * height * 3` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap an RGB buffer, returning `None` if its length does not match the dimensions
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        let expected = width.checked_mul(height)?.checked_mul(3)?;
        if data.len() != expected {
            return None;
        }
        Some(Self { width, height, data })
    }

    /// Uniform image with every sample set to `value`
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height * 3],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl From<RgbImage> for RasterImage {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        // ImageBuffer storage is already packed row-major without padding
        Self {
            width: width as usize,
            height: height as usize,
            data: img.into_raw(),
        }
    }
}

impl From<DynamicImage> for RasterImage {
    fn from(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageRgb8(rgb) => rgb.into(),
            other => other.to_rgb8().into(),
        }
    }
}

/// Load an image file as RGB8
///
/// Grayscale, alpha and 16-bit sources are converted; the alpha channel is
/// dropped.
///
/// # Errors
///
/// `PipelineError::ImageLoad` if the file is missing, unreadable, or not a
/// supported format.
pub fn load_raster(path: &Path) -> Result<RasterImage> {
    let img = image::open(path).map_err(|source| PipelineError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let color = img.color();
    let raster = RasterImage::from(img);
    debug!(
        "Loaded {} ({}x{}, source color {:?})",
        path.display(),
        raster.width(),
        raster.height(),
        color
    );
    Ok(raster)
}
