//! Collaborator traits for durable request state and artifact storage

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::orchestrator::request::{
    GenerationRequest, GenerationStatus, RequestRecord, SurfaceType,
};

/// Durable record of request status and produced artifacts.
///
/// Status updates are idempotent-safe: re-setting the current terminal
/// status is a no-op, and a terminal status is never overwritten. Only the
/// orchestrator writes terminal states.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn create_request(&self, request: &GenerationRequest) -> Result<()>;

    async fn update_status(
        &self,
        id: Uuid,
        status: GenerationStatus,
        error_message: Option<String>,
    ) -> Result<()>;

    async fn create_result(&self, id: Uuid, artifact_ref: &str, surface: SurfaceType)
        -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<RequestRecord>>;
}

/// Opaque put/get storage for image artifacts
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Vec<u8>>;
}
