use std::sync::Arc;

use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use autoshot_core::{
    app_state::AppState,
    config::AppConfig,
    routes,
    services::{
        orchestrator::JobOrchestrator,
        session_store::{spawn_sweeper, InMemorySessionStore},
    },
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing autoshot-core server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("generation_jobs_total", "Total generation jobs started");
    metrics::describe_counter!(
        "generation_jobs_completed",
        "Total generation jobs that returned an output"
    );
    metrics::describe_counter!(
        "generation_jobs_failed",
        "Total generation jobs that failed, by error kind"
    );
    metrics::describe_histogram!(
        "generation_duration_seconds",
        "Wall-clock time from submission to output"
    );
    metrics::describe_gauge!("session_entries", "Current number of session state entries");

    // Session store with background TTL eviction
    let shutdown = CancellationToken::new();
    let sessions = Arc::new(InMemorySessionStore::with_ttl(config.session_ttl()));
    let sweeper = spawn_sweeper(
        sessions.clone(),
        config.session_sweep_interval(),
        shutdown.clone(),
    );

    // Initialize inference job orchestrator
    let orchestrator = JobOrchestrator::from_config(&config);
    if !orchestrator.has_credential() {
        tracing::error!("REPLICATE_API_TOKEN is not set; generation requests will fail");
    }

    let upload_limits = config.upload_limits();
    let body_limit = routes::request_body_limit(&upload_limits);
    let state = AppState::new(
        sessions,
        orchestrator,
        config.model_version.clone(),
        upload_limits,
    );

    let app = routes::build_router(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(body_limit));

    tracing::info!("Starting autoshot-core on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .expect("Server error");

    shutdown.cancel();
    sweeper.await.ok();
}
