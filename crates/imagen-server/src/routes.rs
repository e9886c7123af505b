//! HTTP routes.
//!
//! - `GET /` - health check
//! - `POST /generate` - generate images for a prompt and return them as
//!   base64 JPEGs that fit the configured byte ceiling

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use imagen_core::compress::{compress_image, CompressError, CompressionParams};
use imagen_core::decode::RasterImage;
use imagen_core::{AspectRatio, GenerateError, GenerationRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::AppState;

pub const SERVICE_NAME: &str = "imagen-api";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/generate", post(generate))
        .with_state(state)
}

/// Health check (`GET /`).
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

/// Body of `POST /generate`. Every field is optional at the JSON level so
/// that a missing prompt yields a 400 with a clear message rather than a
/// deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub seed: Option<u32>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
}

impl GenerateBody {
    pub fn into_request(self) -> Result<GenerationRequest, ServerError> {
        let aspect_ratio = match self.aspect_ratio.as_deref() {
            Some(raw) => raw.parse::<AspectRatio>()?,
            None => AspectRatio::default(),
        };
        let request = GenerationRequest {
            prompt: self.prompt.unwrap_or_default(),
            negative_prompt: self.negative_prompt.unwrap_or_default(),
            seed: self.seed,
            aspect_ratio,
        };
        request.validate()?;
        Ok(request)
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: &'static str,
    pub data: GeneratedImages,
}

#[derive(Debug, Serialize)]
pub struct GeneratedImages {
    /// Base64 (standard alphabet) JPEG data, one entry per image.
    pub images: Vec<String>,
    pub prompt: String,
    pub negative_prompt: String,
    pub seed: Option<u32>,
    pub aspect_ratio: AspectRatio,
}

/// Image generation (`POST /generate`).
pub async fn generate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ServerError> {
    let Json(body) = body.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected generate body");
        ServerError::BadRequest(rejection.body_text())
    })?;
    let request = body.into_request().inspect_err(|e| {
        warn!(error = %e, "invalid generate request");
    })?;

    debug!(
        generator = state.generator.name(),
        prompt_len = request.prompt.len(),
        seed = ?request.seed,
        aspect_ratio = %request.aspect_ratio,
        "image generation request"
    );

    let started = Instant::now();
    let images = state.generator.generate(&request).await.inspect_err(|e| {
        warn!(error = %e, "image generation failed");
    })?;
    if images.is_empty() {
        warn!("generator returned no images");
        return Err(GenerateError::EmptyResponse.into());
    }
    let generated_in = started.elapsed();

    let params = state.compression.clone();
    let encoded = tokio::task::spawn_blocking(move || encode_images(&images, &params))
        .await
        .map_err(|e| ServerError::Internal(format!("compression task failed: {e}")))?
        .inspect_err(|e| warn!(error = %e, "compression failed"))?;

    info!(
        images = encoded.len(),
        generate_ms = generated_in.as_millis() as u64,
        total_ms = started.elapsed().as_millis() as u64,
        "image generation done"
    );

    Ok(Json(GenerateResponse {
        status: "success",
        data: GeneratedImages {
            images: encoded,
            prompt: request.prompt,
            negative_prompt: request.negative_prompt,
            seed: request.seed,
            aspect_ratio: request.aspect_ratio,
        },
    }))
}

/// Compress each image to the byte ceiling and base64-encode it.
fn encode_images(
    images: &[RasterImage],
    params: &CompressionParams,
) -> Result<Vec<String>, CompressError> {
    images
        .iter()
        .map(|image| {
            let outcome = compress_image(image, params)?;
            debug!(
                width = outcome.width,
                height = outcome.height,
                quality = outcome.quality,
                bytes = outcome.bytes.len(),
                attempts = outcome.attempts.len(),
                fits = outcome.fits,
                "compressed generated image"
            );
            Ok(BASE64.encode(&outcome.bytes))
        })
        .collect()
}
