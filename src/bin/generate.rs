//! Run a single generation job from the command line.
//!
//! Usage: `generate <params.json>` where the file holds `{"version": ..., "input": {...}}`.
//! `version` may be omitted when `MODEL_VERSION` is set.

use autoshot_core::{
    config::AppConfig,
    models::{generation::GenerateRequest, job::PredictionRequest},
    services::orchestrator::JobOrchestrator,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: generate <params.json>");
        std::process::exit(2);
    };

    let config = AppConfig::from_env().expect("Failed to load configuration");

    let raw = std::fs::read_to_string(&path).expect("Failed to read parameters file");
    let request: GenerateRequest =
        serde_json::from_str(&raw).expect("Parameters file is not a valid generation request");
    let Some(version) = request.version.or(config.model_version.clone()) else {
        tracing::error!("No model version in parameters file and MODEL_VERSION is unset");
        std::process::exit(2);
    };
    let prediction = PredictionRequest {
        version,
        input: request.input,
    };

    let orchestrator = JobOrchestrator::from_config(&config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match orchestrator.run_job_with_cancel(&prediction, &cancel).await {
        Ok(output) => {
            let rendered =
                serde_json::to_string_pretty(&output).expect("Failed to serialize job output");
            println!("{rendered}");
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "Generation failed");
            std::process::exit(1);
        }
    }
}
