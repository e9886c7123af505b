//! Vertex AI Imagen backend.
//!
//! Calls the publisher model `:predict` endpoint and decodes the returned
//! images. The model only ever sees the prompt and options; sizing and JPEG
//! compression happen afterwards in the request handler.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use imagen_core::decode::{decode_image, RasterImage};
use imagen_core::{GenerateError, GenerationRequest, ImageGenerator};
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::auth::TokenSource;
use crate::config::VertexConfig;

/// Model parameters that do not vary per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictOptions {
    pub sample_count: u8,
    pub safety_setting: String,
    pub person_generation: String,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            sample_count: 1,
            safety_setting: "block_some".to_string(),
            person_generation: "allow_adult".to_string(),
        }
    }
}

pub struct VertexImagen {
    http: Client,
    predict_url: String,
    tokens: TokenSource,
    options: PredictOptions,
}

impl VertexImagen {
    pub fn new(
        http: Client,
        predict_url: String,
        tokens: TokenSource,
        options: PredictOptions,
    ) -> Self {
        Self {
            http,
            predict_url,
            tokens,
            options,
        }
    }

    /// Build a client from service configuration.
    pub fn from_config(config: &VertexConfig) -> Result<Self, GenerateError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GenerateError::Transport(format!("failed to build HTTP client: {e}")))?;

        let tokens = match config.access_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => TokenSource::Static(token.to_string()),
            _ => TokenSource::metadata(http.clone()),
        };

        Ok(Self::new(
            http,
            config.predict_url(),
            tokens,
            PredictOptions {
                sample_count: config.number_of_images,
                safety_setting: config.safety_filter_level.clone(),
                person_generation: config.person_generation.clone(),
            },
        ))
    }
}

#[async_trait]
impl ImageGenerator for VertexImagen {
    fn name(&self) -> &str {
        "vertex-imagen"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<RasterImage>, GenerateError> {
        request.validate()?;

        let token = self.tokens.bearer().await?;
        let payload = build_payload(request, &self.options);
        debug!(url = %self.predict_url, "sending Imagen predict request");

        let response = self
            .http
            .post(&self.predict_url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;
        if !status.is_success() {
            let message = upstream_error_message(&body);
            warn!(status = status.as_u16(), %message, "Imagen predict failed");
            return Err(GenerateError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| GenerateError::Transport(format!("invalid predict response: {e}")))?;
        let encoded = extract_predictions(&payload)?;
        if encoded.is_empty() {
            return Err(GenerateError::EmptyResponse);
        }

        // PNG decoding of multi-megapixel images is CPU-bound.
        tokio::task::spawn_blocking(move || {
            encoded
                .iter()
                .map(|bytes| decode_image(bytes).map_err(GenerateError::from))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| GenerateError::Transport(format!("decode task failed: {e}")))?
    }
}

/// JSON body of a `:predict` call.
pub fn build_payload(request: &GenerationRequest, options: &PredictOptions) -> Value {
    let mut parameters = Map::new();
    parameters.insert("sampleCount".to_string(), json!(options.sample_count));
    parameters.insert(
        "aspectRatio".to_string(),
        json!(request.aspect_ratio.as_str()),
    );
    parameters.insert("safetySetting".to_string(), json!(options.safety_setting));
    parameters.insert(
        "personGeneration".to_string(),
        json!(options.person_generation),
    );
    if !request.negative_prompt.trim().is_empty() {
        parameters.insert(
            "negativePrompt".to_string(),
            json!(request.negative_prompt),
        );
    }
    // Imagen rejects a seed while watermarking is on.
    if let Some(seed) = request.seed {
        parameters.insert("seed".to_string(), json!(seed));
        parameters.insert("addWatermark".to_string(), json!(false));
    }

    json!({
        "instances": [{ "prompt": request.prompt }],
        "parameters": parameters,
    })
}

/// Decode the base64 image payloads of a predict response.
///
/// Predictions without image bytes (for example entries carrying only a
/// `raiFilteredReason`) are skipped.
pub fn extract_predictions(payload: &Value) -> Result<Vec<Vec<u8>>, GenerateError> {
    let predictions = payload
        .get("predictions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut out = Vec::with_capacity(predictions.len());
    for prediction in predictions {
        let Some(encoded) = prediction.get("bytesBase64Encoded").and_then(Value::as_str) else {
            if let Some(reason) = prediction.get("raiFilteredReason").and_then(Value::as_str) {
                warn!(%reason, "Imagen filtered a candidate");
            }
            continue;
        };
        let bytes = BASE64.decode(encoded.as_bytes()).map_err(|e| {
            GenerateError::Transport(format!("image payload is not valid base64: {e}"))
        })?;
        out.push(bytes);
    }
    Ok(out)
}

/// Best-effort extraction of `error.message` from a Google API error body.
fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.chars().take(500).collect()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagen_core::AspectRatio;

    #[test]
    fn test_payload_defaults() {
        let request = GenerationRequest::new("a lighthouse at dusk");
        let payload = build_payload(&request, &PredictOptions::default());

        assert_eq!(payload["instances"][0]["prompt"], "a lighthouse at dusk");
        let parameters = &payload["parameters"];
        assert_eq!(parameters["sampleCount"], 1);
        assert_eq!(parameters["aspectRatio"], "3:4");
        assert_eq!(parameters["safetySetting"], "block_some");
        assert_eq!(parameters["personGeneration"], "allow_adult");
        assert!(parameters.get("negativePrompt").is_none());
        assert!(parameters.get("seed").is_none());
        assert!(parameters.get("addWatermark").is_none());
    }

    #[test]
    fn test_payload_with_options() {
        let request = GenerationRequest {
            prompt: "p".into(),
            negative_prompt: "blurry".into(),
            seed: Some(42),
            aspect_ratio: AspectRatio::Landscape16x9,
        };
        let options = PredictOptions {
            sample_count: 3,
            ..PredictOptions::default()
        };
        let payload = build_payload(&request, &options);
        let parameters = &payload["parameters"];

        assert_eq!(parameters["sampleCount"], 3);
        assert_eq!(parameters["aspectRatio"], "16:9");
        assert_eq!(parameters["negativePrompt"], "blurry");
        assert_eq!(parameters["seed"], 42);
        assert_eq!(parameters["addWatermark"], false);
    }

    #[test]
    fn test_extract_predictions() {
        let payload = json!({
            "predictions": [
                { "mimeType": "image/png", "bytesBase64Encoded": BASE64.encode([1u8, 2, 3]) },
                { "raiFilteredReason": "filtered" },
                { "mimeType": "image/png", "bytesBase64Encoded": BASE64.encode([4u8]) },
            ]
        });
        let images = extract_predictions(&payload).unwrap();
        assert_eq!(images, vec![vec![1, 2, 3], vec![4]]);
    }

    #[test]
    fn test_extract_predictions_missing_field() {
        assert!(extract_predictions(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_extract_predictions_bad_base64() {
        let payload = json!({ "predictions": [{ "bytesBase64Encoded": "@@@" }] });
        assert!(matches!(
            extract_predictions(&payload),
            Err(GenerateError::Transport(_))
        ));
    }

    #[test]
    fn test_upstream_error_message() {
        let body = r#"{"error":{"code":403,"message":"Permission denied","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(upstream_error_message(body), "Permission denied");
        assert_eq!(upstream_error_message("  oops "), "oops");
        assert_eq!(upstream_error_message(""), "empty response body");
    }
}
