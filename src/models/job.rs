use serde::{Deserialize, Serialize};
use strum::Display;

/// Lifecycle status reported by the inference provider for a prediction.
///
/// Only `Succeeded` and `Failed` end a poll loop; every other status,
/// including ones this enum does not know about, counts as still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PredictionStatus::Succeeded | PredictionStatus::Failed)
    }
}

/// Body of `POST /predictions`, forwarded to the provider untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub version: String,
    pub input: serde_json::Value,
}

/// A prediction as returned by the create and status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Pick the image URL out of a provider output payload.
///
/// Image models answer either with a single URL or with a list of URLs;
/// the first string wins.
pub fn first_output_url(output: &serde_json::Value) -> Option<String> {
    match output {
        serde_json::Value::String(url) => Some(url.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(first_output_url),
        _ => None,
    }
}
