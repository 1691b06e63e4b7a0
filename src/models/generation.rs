use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ui_state::UiState;

/// Request to run one image generation job.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Model version; falls back to the configured default when omitted.
    #[serde(default)]
    pub version: Option<String>,
    pub input: serde_json::Value,
}

/// Response after a generation job finished successfully.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub output: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_image_url: Option<String>,
}

/// Current session state of the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    pub state: UiState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
