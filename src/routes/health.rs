use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub provider: ComponentHealth,
    pub sessions: ComponentHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
}

/// GET /health — liveness plus provider credential and session store status.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let provider_check = ComponentHealth {
        status: if state.orchestrator.has_credential() {
            "ok".to_string()
        } else {
            "unconfigured".to_string()
        },
        entries: None,
    };

    let sessions_check = ComponentHealth {
        status: "ok".to_string(),
        entries: Some(state.sessions.entry_count().await),
    };

    let all_healthy = provider_check.status == "ok";
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            provider: provider_check,
            sessions: sessions_check,
        },
    };

    (status_code, Json(response))
}
