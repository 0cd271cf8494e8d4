//! Per-request generation lifecycle driver.
//!
//! Sequences fetch -> admission -> backend call -> post-process -> persist
//! and records the terminal status. This is the only layer that writes
//! terminal states to the result store.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::backend::traits::GenerationBackend;
use crate::error::{AppError, Result};
use crate::fetch::ImageFetcher;
use crate::orchestrator::postprocess;
use crate::orchestrator::request::{
    truncate_error_summary, GenerationRequest, GenerationStatus, RequestRecord,
};
use crate::prompt;
use crate::queue::admission::AdmissionQueue;
use crate::queue::retry::{retry_generation, RetryPolicy};
use crate::store::traits::{ObjectStore, ResultStore};

#[derive(Clone)]
pub struct GenerationEngine {
    queue: Arc<AdmissionQueue>,
    backend: Arc<dyn GenerationBackend>,
    fetcher: Arc<ImageFetcher>,
    results: Arc<dyn ResultStore>,
    objects: Arc<dyn ObjectStore>,
    retry_policy: RetryPolicy,
}

impl GenerationEngine {
    pub fn new(
        queue: Arc<AdmissionQueue>,
        backend: Arc<dyn GenerationBackend>,
        fetcher: Arc<ImageFetcher>,
        results: Arc<dyn ResultStore>,
        objects: Arc<dyn ObjectStore>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            backend,
            fetcher,
            results,
            objects,
            retry_policy,
        }
    }

    /// Accept a request and start processing it in the background.
    ///
    /// Validation failures are reported synchronously and never consume an
    /// admission slot. An accepted request always reaches a terminal state.
    pub async fn submit(&self, request: GenerationRequest) -> Result<Uuid> {
        request.validate()?;

        let id = request.id;
        self.results.create_request(&request).await?;
        info!(request_id = %id, surface = %request.surface, "request accepted");

        let engine = self.clone();
        tokio::spawn(async move {
            engine.process(request).await;
        });

        Ok(id)
    }

    /// Submit several independent requests, spacing submissions out to avoid
    /// bursting the admission path. Purely burst smoothing: no cross-request
    /// ordering is implied.
    pub async fn submit_batch(
        &self,
        requests: Vec<GenerationRequest>,
        stagger: Duration,
    ) -> Result<Vec<Uuid>> {
        let mut ids = Vec::with_capacity(requests.len());
        for (index, request) in requests.into_iter().enumerate() {
            if index > 0 && !stagger.is_zero() {
                tokio::time::sleep(stagger).await;
            }
            ids.push(self.submit(request).await?);
        }
        Ok(ids)
    }

    pub async fn status(&self, id: Uuid) -> Result<RequestRecord> {
        self.results
            .get(id)
            .await?
            .ok_or(AppError::RequestNotFound(id))
    }

    async fn process(&self, request: GenerationRequest) {
        let id = request.id;

        if let Err(err) = self
            .results
            .update_status(id, GenerationStatus::Generating, None)
            .await
        {
            error!(request_id = %id, error = %err, "failed to mark request as generating");
            return;
        }

        match self.run_pipeline(&request).await {
            Ok(()) => {
                if let Err(err) = self
                    .results
                    .update_status(id, GenerationStatus::Completed, None)
                    .await
                {
                    error!(request_id = %id, error = %err, "failed to record completion");
                } else {
                    info!(request_id = %id, "generation completed");
                }
            }
            Err(err) => {
                error!(request_id = %id, error = %err, "generation failed");
                let summary = truncate_error_summary(&err.to_string());
                if let Err(store_err) = self
                    .results
                    .update_status(id, GenerationStatus::Failed, Some(summary))
                    .await
                {
                    error!(request_id = %id, error = %store_err, "failed to record failure");
                }
            }
        }
    }

    async fn run_pipeline(&self, request: &GenerationRequest) -> Result<()> {
        let room = self.fetcher.fetch(&request.source_image).await?;
        let dimensions = postprocess::probe_dimensions(&room.bytes)?;

        let mut swatches = Vec::with_capacity(request.products.len());
        for product in &request.products {
            swatches.push(self.fetcher.fetch(&product.swatch).await?);
        }

        let payload = prompt::build_payload(request, dimensions, &room, &swatches);

        let artifact = {
            // Slot held for the whole logical call, retries included; the
            // permit drop releases it on every exit path.
            let _permit = self.queue.acquire().await?;
            debug!(request_id = %request.id, "admission slot acquired");
            retry_generation(
                || self.backend.generate(&payload),
                &self.retry_policy,
                self.queue.as_ref(),
            )
            .await?
        };

        let normalized = postprocess::normalize_dimensions(&artifact, dimensions.0, dimensions.1)?;

        let artifact_ref = format!("{}-{}.png", request.id, request.surface);
        self.objects.put(&artifact_ref, &normalized).await?;
        self.results
            .create_result(request.id, &artifact_ref, request.surface)
            .await?;

        Ok(())
    }
}
