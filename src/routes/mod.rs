use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::app_state::AppState;
use crate::models::ui_state::UploadLimits;

pub mod generate;
pub mod health;
pub mod identity;
pub mod metrics;
pub mod session;

/// Largest request body accepted for the given upload limits. Uploads
/// arrive base64-encoded, which is a third larger than the file.
pub fn request_body_limit(limits: &UploadLimits) -> usize {
    (limits.max_upload_bytes as usize) / 3 * 4 + 64 * 1024
}

/// API routes for the generation workflow. `/metrics` and the HTTP layers
/// are added by the server binary.
pub fn build_router(state: AppState) -> Router {
    let body_limit = request_body_limit(&state.upload_limits);

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/state",
            get(session::get_state)
                .put(session::put_state)
                .delete(session::delete_state),
        )
        .route("/api/v1/state/{field}", patch(session::patch_state_property))
        .route("/api/v1/generate", post(generate::generate))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
