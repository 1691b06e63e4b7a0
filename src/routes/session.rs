use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::models::generation::{ErrorResponse, StateResponse};
use crate::models::ui_state::{StateValidationError, UiState, UiStateKey};
use crate::routes::identity::UserIdentity;
use crate::services::state_accessor::StateAccessor;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// GET /api/v1/state — the caller's current workflow state.
pub async fn get_state(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
) -> Json<StateResponse> {
    let accessor = state.accessor(user_id);
    Json(snapshot(&state, &accessor).await)
}

/// PUT /api/v1/state — merge a partial state into the caller's entry.
pub async fn put_state(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    Json(patch): Json<UiState>,
) -> Result<Json<StateResponse>, ApiError> {
    patch
        .validate_patch(&state.upload_limits)
        .map_err(unprocessable)?;

    let accessor = state.accessor(user_id);
    accessor.update_state(patch).await;
    Ok(Json(snapshot(&state, &accessor).await))
}

/// PATCH /api/v1/state/{field} — set a single field; the body is its value.
pub async fn patch_state_property(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    Path(name): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> Result<Json<StateResponse>, ApiError> {
    let key: UiStateKey = name.parse().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!("Unknown state field: {name}"))),
        )
    })?;
    let field = key.with_value(value).map_err(unprocessable)?;
    UiState::from(field.clone())
        .validate_patch(&state.upload_limits)
        .map_err(unprocessable)?;

    let accessor = state.accessor(user_id);
    accessor.update_state_property(field).await;
    Ok(Json(snapshot(&state, &accessor).await))
}

/// DELETE /api/v1/state — drop the caller's entry.
pub async fn delete_state(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
) -> StatusCode {
    state.accessor(user_id).clear_state().await;
    StatusCode::NO_CONTENT
}

async fn snapshot(state: &AppState, accessor: &StateAccessor) -> StateResponse {
    let updated_at = match accessor.user_id() {
        Some(user_id) => state.sessions.last_updated(user_id).await,
        None => None,
    };
    StateResponse {
        state: accessor.state().await,
        updated_at,
    }
}

fn unprocessable(error: StateValidationError) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse::new(error.to_string())),
    )
}
