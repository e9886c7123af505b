//! Tuning knobs for the adaptive compressor.

use serde::{Deserialize, Serialize};

use super::CompressError;
use crate::decode::FilterType;

/// Default byte ceiling for an encoded image (1 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;

/// Default pixel ceiling applied before any quality search.
pub const DEFAULT_MAX_PIXELS: u64 = 1_000_000;

/// Parameters for [`compress_image`](super::compress_image).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionParams {
    /// Maximum encoded size in bytes.
    pub max_bytes: u64,
    /// Maximum `width * height` before the one-off pre-resize.
    pub max_pixels: u64,
    /// JPEG quality of the first attempt.
    pub initial_quality: u8,
    /// Lowest JPEG quality the search will use.
    pub quality_floor: u8,
    /// Quality decrement per failed attempt.
    pub quality_step: u8,
    /// Per-attempt shrink factor for width and height, in (0, 1).
    pub downscale_factor: f64,
    /// Upper bound on encode attempts.
    pub max_iterations: u32,
    /// Width/height below which the image is not shrunk any further.
    pub min_dimension: u32,
    /// Resampling filter for both the pre-resize and the shrink steps.
    pub filter: FilterType,
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_pixels: DEFAULT_MAX_PIXELS,
            initial_quality: 50,
            quality_floor: 10,
            quality_step: 5,
            downscale_factor: 0.9,
            max_iterations: 64,
            min_dimension: 8,
            filter: FilterType::Lanczos3,
        }
    }
}

impl CompressionParams {
    /// Default parameters with a different byte ceiling.
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }

    /// Check the parameter invariants.
    ///
    /// Requires `1 <= quality_floor <= initial_quality <= 100`, non-zero
    /// ceilings, step and iteration bound, and a shrink factor strictly
    /// between 0 and 1.
    pub fn validate(&self) -> Result<(), CompressError> {
        if self.max_bytes == 0 {
            return Err(CompressError::InvalidInput(
                "max_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_pixels == 0 {
            return Err(CompressError::InvalidInput(
                "max_pixels must be greater than zero".to_string(),
            ));
        }
        if self.quality_floor == 0
            || self.quality_floor > self.initial_quality
            || self.initial_quality > 100
        {
            return Err(CompressError::InvalidInput(format!(
                "quality range must satisfy 1 <= floor ({}) <= initial ({}) <= 100",
                self.quality_floor, self.initial_quality
            )));
        }
        if self.quality_step == 0 {
            return Err(CompressError::InvalidInput(
                "quality_step must be greater than zero".to_string(),
            ));
        }
        if !(self.downscale_factor > 0.0 && self.downscale_factor < 1.0) {
            return Err(CompressError::InvalidInput(format!(
                "downscale_factor must be in (0, 1), got {}",
                self.downscale_factor
            )));
        }
        if self.max_iterations == 0 {
            return Err(CompressError::InvalidInput(
                "max_iterations must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
