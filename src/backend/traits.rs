//! Common traits and types for the image generation backend

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::prompt::PromptPayload;

/// Failure shapes surfaced by a generation backend.
///
/// Every variant is retryable within the attempt budget; rate-limited
/// failures additionally engage the shared admission cooldown.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend rate limited")]
    RateLimited {
        /// Backend-advertised wait, when present (e.g. a Retry-After header)
        retry_after: Option<Duration>,
    },

    #[error("transient backend failure: {0}")]
    Transient(String),
}

impl BackendError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, BackendError::RateLimited { .. })
    }
}

/// Trait for the image generation backend.
///
/// The backend is an opaque collaborator: one prompt plus one-to-three
/// image payloads in, raw image bytes out.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, payload: &PromptPayload) -> std::result::Result<Vec<u8>, BackendError>;
}
