//! OAuth access tokens for Vertex AI.

use std::time::{Duration, Instant};

use imagen_core::GenerateError;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

/// Token endpoint of the instance metadata server (Cloud Run, GCE, GKE).
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Where bearer tokens come from.
pub enum TokenSource {
    /// A fixed token, typically from `gcloud auth print-access-token`.
    Static(String),
    /// The instance metadata server, with the current token cached.
    Metadata(MetadataTokenSource),
}

impl TokenSource {
    pub fn metadata(http: Client) -> Self {
        TokenSource::Metadata(MetadataTokenSource::new(http, METADATA_TOKEN_URL))
    }

    pub async fn bearer(&self) -> Result<String, GenerateError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata(source) => source.token().await,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

pub struct MetadataTokenSource {
    http: Client,
    url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataTokenSource {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            cached: Mutex::new(None),
        }
    }

    /// Return the cached token, fetching a new one when it is missing or
    /// about to expire. Concurrent callers wait on the same refresh.
    pub async fn token(&self) -> Result<String, GenerateError> {
        let mut cached = self.cached.lock().await;
        let now = Instant::now();
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let fetched = self.fetch().await?;
        debug!(expires_in = fetched.expires_in, "refreshed metadata access token");
        let token = CachedToken {
            value: fetched.access_token,
            expires_at: now + Duration::from_secs(fetched.expires_in),
        };
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch(&self) -> Result<MetadataToken, GenerateError> {
        let response = self
            .http
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| GenerateError::Auth(format!("metadata server unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::Auth(format!(
                "metadata server returned {}",
                status.as_u16()
            )));
        }

        response
            .json::<MetadataToken>()
            .await
            .map_err(|e| GenerateError::Auth(format!("invalid metadata token response: {e}")))
    }
}
