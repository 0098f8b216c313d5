//! Audio generation provider seam.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use station_core::types::DbId;

/// Header the provider may use to return its own request reference.
const PROVIDER_REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Provider returned no audio")]
    EmptyAudio,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub track_id: DbId,
    pub prompt: String,
    pub duration_secs: i32,
}

#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub bytes: Vec<u8>,
    pub provider_request_id: Option<String>,
}

#[async_trait]
pub trait AudioProvider: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedAudio, ProviderError>;
}

/// Provider reached over HTTP: `POST <endpoint>` with a JSON
/// [`GenerationRequest`], audio bytes in the response body.
pub struct HttpAudioProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAudioProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl AudioProvider for HttpAudioProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedAudio, ProviderError> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status().as_u16()));
        }

        let provider_request_id = response
            .headers()
            .get(PROVIDER_REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::EmptyAudio);
        }

        Ok(GeneratedAudio {
            bytes: bytes.to_vec(),
            provider_request_id,
        })
    }
}
