//! Service configuration.
//!
//! Everything the service needs is parsed once at startup into
//! [`ServiceConfig`] (command-line flags, falling back to environment
//! variables) and passed down explicitly.

use std::net::IpAddr;
use std::time::Duration;

use clap::{Args, Parser};
use imagen_core::compress::{
    CompressError, CompressionParams, DEFAULT_MAX_BYTES, DEFAULT_MAX_PIXELS,
};

/// Imagen model used when none is configured.
pub const DEFAULT_MODEL: &str = "imagen-3.0-generate-002";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "imagen-api",
    version,
    about = "HTTP wrapper around Vertex AI Imagen returning size-bounded JPEGs"
)]
pub struct ServiceConfig {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on (Cloud Run injects PORT).
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[command(flatten)]
    pub vertex: VertexConfig,

    #[command(flatten)]
    pub compression: CompressionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct VertexConfig {
    /// Google Cloud project hosting the model.
    #[arg(long, env = "PROJECT_ID")]
    pub project_id: String,

    /// Vertex AI region.
    #[arg(long, env = "LOCATION", default_value = "us-central1")]
    pub location: String,

    #[arg(long, env = "IMAGEN_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Override for the API base URL; defaults to the regional endpoint.
    #[arg(long, env = "VERTEX_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Fixed OAuth access token. Without it tokens come from the metadata
    /// server of the Cloud Run / GCE instance.
    #[arg(long, env = "VERTEX_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, env = "SAFETY_FILTER_LEVEL", default_value = "block_some")]
    pub safety_filter_level: String,

    #[arg(long, env = "PERSON_GENERATION", default_value = "allow_adult")]
    pub person_generation: String,

    /// Images requested per prompt.
    #[arg(
        long,
        env = "NUMBER_OF_IMAGES",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(1..=4)
    )]
    pub number_of_images: u8,

    /// Timeout for a single predict call, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    pub request_timeout_secs: u64,
}

impl VertexConfig {
    /// Base URL of the Vertex AI API for the configured region.
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim().trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }

    /// Full `:predict` URL of the configured model.
    pub fn predict_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.endpoint(),
            self.project_id,
            self.location,
            self.model
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompressionArgs {
    /// Byte ceiling for each returned JPEG.
    #[arg(
        long,
        env = "MAX_IMAGE_BYTES",
        default_value_t = DEFAULT_MAX_BYTES,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_image_bytes: u64,

    /// Pixel ceiling applied before compression.
    #[arg(
        long,
        env = "MAX_IMAGE_PIXELS",
        default_value_t = DEFAULT_MAX_PIXELS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_image_pixels: u64,
}

impl CompressionArgs {
    /// Compression parameters for every request, checked once at startup so
    /// a bad ceiling never reaches a (billed) generation call.
    pub fn to_params(&self) -> Result<CompressionParams, CompressError> {
        let params = CompressionParams {
            max_bytes: self.max_image_bytes,
            max_pixels: self.max_image_pixels,
            ..CompressionParams::default()
        };
        params.validate()?;
        Ok(params)
    }
}
