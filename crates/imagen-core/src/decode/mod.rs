//! Image decoding and resizing for imagen-api.
//!
//! This module provides functionality for:
//! - Decoding generated image bytes (PNG or JPEG) into RGB rasters
//! - Resizing rasters for pixel budgets and shrink steps
//!
//! All operations are synchronous and allocate fresh images; inputs are never
//! mutated.

mod bytes;
mod resize;
mod types;

pub use bytes::decode_image;
pub use resize::{fit_pixel_budget, resize, scale_dimensions};
pub use types::{DecodeError, FilterType, RasterImage};
