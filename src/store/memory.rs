//! In-memory result store backed by a concurrent map

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::warn;
use uuid::Uuid;

use super::traits::ResultStore;
use crate::error::{AppError, Result};
use crate::orchestrator::request::{
    GenerationRequest, GenerationResult, GenerationStatus, RequestRecord, SurfaceType,
};

#[derive(Default)]
pub struct MemoryResultStore {
    records: DashMap<Uuid, RequestRecord>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn create_request(&self, request: &GenerationRequest) -> Result<()> {
        let now = Utc::now();
        self.records.insert(
            request.id,
            RequestRecord {
                id: request.id,
                surface: request.surface,
                status: GenerationStatus::Pending,
                error_message: None,
                results: Vec::new(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: GenerationStatus,
        error_message: Option<String>,
    ) -> Result<()> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or(AppError::RequestNotFound(id))?;

        if record.status.is_terminal() {
            if record.status != status {
                warn!(
                    request_id = %id,
                    current = %record.status,
                    requested = %status,
                    "ignoring status transition out of terminal state"
                );
            }
            return Ok(());
        }

        record.status = status;
        record.error_message = error_message;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn create_result(
        &self,
        id: Uuid,
        artifact_ref: &str,
        surface: SurfaceType,
    ) -> Result<()> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or(AppError::RequestNotFound(id))?;

        record.results.push(GenerationResult {
            artifact_ref: artifact_ref.to_string(),
            surface,
            created_at: Utc::now(),
        });
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<RequestRecord>> {
        Ok(self.records.get(&id).map(|record| record.clone()))
    }
}
