//! Main entry point for the visualization orchestrator

use roomviz_orchestrator::{
    api,
    backend::http_backend::{HttpBackendConfig, HttpGenerationBackend},
    config::Settings,
    fetch::{FetcherConfig, ImageFetcher},
    orchestrator::engine::GenerationEngine,
    queue::{admission::AdmissionQueue, retry::RetryPolicy},
    store::{file::FileObjectStore, memory::MemoryResultStore},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    settings.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));

    match settings.logging.format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init(),
    }

    info!("Starting room visualization orchestrator");
    info!(
        "Loaded configuration: server={}:{}, max_concurrent={}",
        settings.server.host, settings.server.port, settings.generation.max_concurrent
    );

    let queue = Arc::new(AdmissionQueue::new(settings.generation.max_concurrent));

    let backend = Arc::new(HttpGenerationBackend::new(&HttpBackendConfig {
        endpoint: settings.backend.endpoint.clone(),
        timeout: Duration::from_millis(settings.backend.timeout_ms),
    })?);

    let fetcher = Arc::new(ImageFetcher::new(FetcherConfig {
        max_retries: settings.fetch.max_retries,
        base_delay: Duration::from_millis(settings.fetch.base_delay_ms),
        timeout: Duration::from_secs(settings.fetch.timeout_secs),
        cache_ttl: Duration::from_secs(settings.fetch.cache_ttl_secs),
    })?);

    let results = Arc::new(MemoryResultStore::new());
    let objects = Arc::new(FileObjectStore::new(settings.storage.base_path.clone()));

    let retry_policy = RetryPolicy {
        max_retries: settings.generation.max_retries,
        base_delay: Duration::from_millis(settings.generation.base_delay_ms),
    };

    let engine = Arc::new(GenerationEngine::new(
        queue.clone(),
        backend,
        fetcher,
        results,
        objects,
        retry_policy,
    ));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let app_state = Arc::new(AppState {
        settings,
        engine,
        queue,
    });

    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
