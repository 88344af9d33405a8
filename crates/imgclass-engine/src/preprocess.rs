//! Raster to accelerator tensor conversion
//!
//! One pass does three things:
//! - narrows `u8` samples to `f16`
//! - swaps rows and columns into the accelerator's memory order
//! - zero-centers by subtracting [`PIXEL_BIAS`] (no scaling)
//!
//! The index formulas below are the accelerator's documented layout and are
//! reproduced exactly. Note that the source index adds the channel offset to a
//! *pixel* index rather than a sample index, so neighbouring pixels' reads and
//! writes overlap, and only the first `width * height + 2` destination slots
//! are ever written. Slots that are never written stay zero.

use half::f16;
use tracing::trace;

use crate::error::{PipelineError, Result};
use crate::image_loader::RasterImage;

/// Subtracted from every 8-bit sample before narrowing
pub const PIXEL_BIAS: i16 = 128;

/// Channels per pixel
pub const CHANNELS: usize = 3;

/// Half-precision input ready to be copied into the backend
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    width: usize,
    height: usize,
    data: Vec<f16>,
}

impl InputTensor {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of `f16` elements (`width * height * 3`)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f16] {
        &self.data
    }

    /// Raw native-endian storage, two bytes per element
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// Index read for pixel (`column`, `row`) and channel offset `channel`
#[inline]
pub fn source_index(column: usize, row: usize, channel: usize, height: usize) -> usize {
    column * height + row + channel
}

/// Index written for pixel (`column`, `row`) and channel offset `channel`
#[inline]
pub fn destination_index(column: usize, row: usize, channel: usize, width: usize) -> usize {
    row * width + column + channel
}

/// Zero-center one sample and narrow it to half precision
#[inline]
pub fn center_sample(sample: u8) -> f16 {
    // Every value in -128..=127 is exactly representable in f16
    f16::from_f32((sample as i16 - PIXEL_BIAS) as f32)
}

/// Convert an RGB raster into the accelerator input tensor
///
/// Columns are the outer loop, rows the inner loop and channels the innermost,
/// in that order; when two iterations hit the same destination slot the later
/// one wins.
///
/// # Errors
///
/// `PipelineError::Allocation` if the output buffer cannot be reserved.
pub fn preprocess(raster: &RasterImage) -> Result<InputTensor> {
    let width = raster.width();
    let height = raster.height();
    let elements = width * height * CHANNELS;

    let mut data: Vec<f16> = Vec::new();
    data.try_reserve_exact(elements)
        .map_err(|source| PipelineError::Allocation { elements, source })?;
    data.resize(elements, f16::ZERO);

    let src = raster.as_bytes();
    for column in 0..width {
        for row in 0..height {
            for channel in 0..CHANNELS {
                data[destination_index(column, row, channel, width)] =
                    center_sample(src[source_index(column, row, channel, height)]);
            }
        }
    }

    trace!("Preprocessed {}x{} raster into {} elements", width, height, elements);
    Ok(InputTensor { width, height, data })
}
