//! The text-to-image capability.
//!
//! Image synthesis is delegated to an external model. [`ImageGenerator`] is
//! the narrow seam the HTTP layer depends on, so handlers and the compressor
//! can be exercised against an in-process fake.

mod request;

use async_trait::async_trait;
use thiserror::Error;

use crate::decode::{DecodeError, RasterImage};

pub use request::{AspectRatio, GenerationRequest};

/// Errors from an image generation backend.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The request was rejected before reaching the model.
    #[error("{0}")]
    InvalidRequest(String),

    /// Credentials could not be obtained.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The model endpoint could not be reached.
    #[error("request to image model failed: {0}")]
    Transport(String),

    /// The model endpoint answered with a non-success status.
    #[error("image model returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The model answered successfully but produced no images (for example
    /// when every candidate was removed by the safety filter).
    #[error("image model returned no images")]
    EmptyResponse,

    /// A returned image could not be decoded.
    #[error("generated image could not be decoded: {0}")]
    Decode(#[from] DecodeError),
}

/// A backend that turns a prompt into images.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Generate images for `request`. Implementations return at least one
    /// image or an error.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<Vec<RasterImage>, GenerateError>;
}
