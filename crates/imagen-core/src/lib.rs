//! imagen-core - image handling for the imagen-api service
//!
//! This crate provides the parts of the service that do not need a network:
//! decoding generated images, JPEG encoding, the size-bounded adaptive
//! compressor, and the generation capability trait the HTTP layer is written
//! against.

pub mod compress;
pub mod decode;
pub mod encode;
pub mod generate;

pub use compress::{compress_image, CompressError, CompressionOutcome, CompressionParams};
pub use decode::{decode_image, FilterType, RasterImage};
pub use generate::{AspectRatio, GenerateError, GenerationRequest, ImageGenerator};
