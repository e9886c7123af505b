//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use imagen_core::{CompressError, GenerateError};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by request handlers. Every variant renders as
/// `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Compress(#[from] CompressError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::Generate(GenerateError::InvalidRequest(_)) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServerError::BadRequest("nope".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(GenerateError::InvalidRequest("prompt is required".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(GenerateError::EmptyResponse).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::from(CompressError::InvalidInput("zero area".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_passthrough() {
        let err = ServerError::from(GenerateError::Upstream {
            status: 429,
            message: "Quota exceeded".into(),
        });
        assert_eq!(err.to_string(), "image model returned 429: Quota exceeded");
    }
}
