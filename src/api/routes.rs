//! HTTP API routes: submit, status, health

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::rate_limit::RateLimitLayer;
use crate::orchestrator::request::{
    GenerationRequest, GenerationStatus, ImageSource, ProductReference, SurfaceType,
};
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/v1/visualizations", post(submit_visualization))
        .route("/v1/visualizations/batch", post(submit_visualization_batch))
        .route("/v1/visualizations/:id", get(visualization_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let router = if state.settings.rate_limit.enabled {
        router.layer(RateLimitLayer::new(
            state.settings.rate_limit.requests_per_second,
            state.settings.rate_limit.burst_size,
        ))
    } else {
        router
    };

    router.with_state(state)
}

/// Submission body for a visualization request
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub source_image: String,
    pub surface: SurfaceType,
    #[serde(default)]
    pub pattern: Option<String>,
    pub products: Vec<SubmitProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitProduct {
    pub name: String,
    pub swatch: String,
    #[serde(default)]
    pub descriptor: Option<String>,
}

#[derive(Serialize)]
struct SubmitResponse {
    request_id: Uuid,
    status: GenerationStatus,
}

fn into_generation_request(body: SubmitRequest) -> GenerationRequest {
    GenerationRequest {
        id: body.id.unwrap_or_else(Uuid::new_v4),
        source_image: ImageSource::from(body.source_image),
        products: body
            .products
            .into_iter()
            .map(|product| ProductReference {
                name: product.name,
                swatch: ImageSource::from(product.swatch),
                descriptor: product.descriptor,
            })
            .collect(),
        surface: body.surface,
        pattern: body.pattern,
    }
}

async fn submit_visualization(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitRequest>,
) -> Result<impl IntoResponse> {
    let request_id = state.engine.submit(into_generation_request(body)).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            request_id,
            status: GenerationStatus::Pending,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SubmitBatchRequest {
    pub requests: Vec<SubmitRequest>,
}

#[derive(Serialize)]
struct SubmitBatchResponse {
    request_ids: Vec<Uuid>,
}

async fn submit_visualization_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitBatchRequest>,
) -> Result<impl IntoResponse> {
    let stagger = Duration::from_millis(state.settings.generation.submit_stagger_ms);
    let requests = body
        .requests
        .into_iter()
        .map(into_generation_request)
        .collect();

    let request_ids = state.engine.submit_batch(requests, stagger).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitBatchResponse { request_ids }),
    ))
}

#[derive(Serialize)]
struct StatusResponse {
    request_id: Uuid,
    status: GenerationStatus,
    results: Vec<ResultEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ResultEntry {
    artifact_ref: String,
    surface: SurfaceType,
    created_at: DateTime<Utc>,
}

async fn visualization_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>> {
    let record = state.engine.status(id).await?;

    Ok(Json(StatusResponse {
        request_id: record.id,
        status: record.status,
        results: record
            .results
            .into_iter()
            .map(|result| ResultEntry {
                artifact_ref: result.artifact_ref,
                surface: result.surface,
                created_at: result.created_at,
            })
            .collect(),
        error_message: record.error_message,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    queue: QueueHealth,
}

#[derive(Serialize)]
struct QueueHealth {
    max_concurrent: usize,
    available_slots: usize,
    cooldown_remaining_secs: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        queue: QueueHealth {
            max_concurrent: state.queue.max_concurrent(),
            available_slots: state.queue.available_slots(),
            cooldown_remaining_secs: state.queue.cooldown_remaining().as_secs(),
        },
    })
}
