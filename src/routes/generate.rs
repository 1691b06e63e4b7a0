use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tokio_util::sync::CancellationToken;

use crate::app_state::AppState;
use crate::models::generation::{ErrorResponse, GenerateRequest, GenerateResponse};
use crate::models::job::{first_output_url, PredictionRequest};
use crate::models::ui_state::UiStateField;
use crate::routes::identity::UserIdentity;
use crate::services::orchestrator::{JobError, USER_FACING_MESSAGE};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// POST /api/v1/generate — run one generation job and store the result URL
/// in the caller's session.
pub async fn generate(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if user_id.is_none() {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Sign in to generate images")),
        ));
    }

    let version = request
        .version
        .or_else(|| state.default_model_version.clone())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Model version is required")),
            )
        })?;
    let prediction = PredictionRequest {
        version,
        input: request.input,
    };

    // The run lives on its own task; if the client goes away this handler is
    // dropped, the guard fires and the run stops at its next suspension point.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let orchestrator = state.orchestrator.clone();
    let run = tokio::spawn(async move {
        orchestrator
            .run_job_with_cancel(&prediction, &cancel)
            .await
    });

    let output = match run.await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(job_error_response(&e)),
        Err(e) => {
            tracing::error!(error = %e, "Generation task aborted");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(USER_FACING_MESSAGE)),
            ));
        }
    };

    let generated_image_url = first_output_url(&output);
    if let Some(url) = &generated_image_url {
        state
            .accessor(user_id)
            .update_state_property(UiStateField::GeneratedImageUrl(url.clone()))
            .await;
    }

    Ok(Json(GenerateResponse {
        output,
        generated_image_url,
    }))
}

fn job_error_response(error: &JobError) -> ApiError {
    let status = match error {
        JobError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(ErrorResponse::new(error.user_message())))
}
