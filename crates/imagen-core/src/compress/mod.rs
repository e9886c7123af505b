//! Adaptive compression of rasters into a byte-size budget.
//!
//! This module provides:
//! - [`CompressionParams`] with the byte/pixel ceilings and search knobs
//! - [`compress_image`], the bounded quality/resolution search
//! - [`compress_encoded`] for callers holding encoded bytes rather than pixels
//!
//! The search is synchronous and CPU-bound. It holds no shared state, so it
//! can run concurrently from any number of callers.

mod adaptive;
mod params;

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;

pub use adaptive::{compress, compress_encoded, compress_image, Attempt, CompressionOutcome};
pub use params::{CompressionParams, DEFAULT_MAX_BYTES, DEFAULT_MAX_PIXELS};

/// Errors returned by the compressor.
#[derive(Debug, Error)]
pub enum CompressError {
    /// The image or the parameters are unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The JPEG encoder failed on otherwise valid input.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A resize step failed.
    #[error("Resize failed: {0}")]
    Resize(#[from] DecodeError),
}
