//! Room-Surface Visualization Orchestrator
//!
//! Accepts visualization requests, throttles them against a third-party
//! image-generation backend's concurrency and rate limits, retries transient
//! failures with backoff, and drives every accepted request to a terminal
//! state.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod fetch;
pub mod middleware;
pub mod orchestrator;
pub mod prompt;
pub mod queue;
pub mod store;

pub use error::{AppError, Result};

use std::sync::Arc;

use orchestrator::engine::GenerationEngine;
use queue::admission::AdmissionQueue;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: config::Settings,
    pub engine: Arc<GenerationEngine>,
    pub queue: Arc<AdmissionQueue>,
}
