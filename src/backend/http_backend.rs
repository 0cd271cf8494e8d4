//! HTTP client for the image generation backend

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::backend::traits::{BackendError, GenerationBackend};
use crate::error::{AppError, Result};
use crate::prompt::{ImagePayload, PromptPayload};

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

/// HTTP-based image generation backend
pub struct HttpGenerationBackend {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct ApiGenerateRequest<'a> {
    prompt: &'a str,
    images: &'a [ImagePayload],
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct ApiGenerateResponse {
    /// Base64 encoded artifact
    image: String,
}

impl HttpGenerationBackend {
    pub fn new(config: &HttpBackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    async fn generate(&self, payload: &PromptPayload) -> std::result::Result<Vec<u8>, BackendError> {
        let url = format!("{}/v1/images/edits", self.endpoint);
        debug!(url = %url, images = payload.images.len(), "sending generation request");

        let request = ApiGenerateRequest {
            prompt: &payload.text,
            images: &payload.images,
            width: payload.width,
            height: payload.height,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Transient(format!("POST {}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(BackendError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Transient(format!(
                "backend returned {}: {}",
                status, body
            )));
        }

        let api_response: ApiGenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Transient(format!("malformed backend response: {}", e)))?;

        STANDARD
            .decode(api_response.image.trim())
            .map_err(|e| BackendError::Transient(format!("invalid base64 artifact: {}", e)))
    }
}
