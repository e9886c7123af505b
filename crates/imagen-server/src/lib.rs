//! imagen-server - HTTP service around Vertex AI Imagen
//!
//! Generated images are passed through the adaptive compressor from
//! `imagen-core` and returned as base64 JPEGs inside a JSON envelope.
//!
//! # Module Structure
//!
//! - `config` - command-line / environment configuration
//! - `routes` - axum router and handlers
//! - `vertex` - Vertex AI Imagen implementation of [`ImageGenerator`]
//! - `auth` - bearer token sources for Vertex AI
//! - `error` - handler error type and its JSON rendering

use std::sync::Arc;

use imagen_core::compress::CompressionParams;
use imagen_core::ImageGenerator;

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod vertex;

pub use config::ServiceConfig;
pub use error::ServerError;
pub use routes::router;
pub use vertex::VertexImagen;

/// State shared by all handlers.
pub struct AppState {
    pub generator: Arc<dyn ImageGenerator>,
    pub compression: CompressionParams,
}

impl AppState {
    pub fn new(generator: Arc<dyn ImageGenerator>, compression: CompressionParams) -> Self {
        Self {
            generator,
            compression,
        }
    }
}
