//! Lossy image encoding.
//!
//! JPEG is the only output format: the service returns compressed images as
//! base64 JPEG, and consumers rely on that format.

mod jpeg;

pub use jpeg::{encode_jpeg, encode_raster, EncodeError};
