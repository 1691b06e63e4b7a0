use std::time::Duration;

use serde::Deserialize;

use crate::models::ui_state::{UploadLimits, DEFAULT_MAX_UPLOAD_BYTES};
use crate::services::orchestrator::PollPolicy;
use crate::services::provider::DEFAULT_BASE_URL;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Replicate API token. Jobs fail with a configuration error while unset.
    #[serde(default)]
    pub replicate_api_token: Option<String>,

    /// Replicate API base URL
    #[serde(default = "default_replicate_base_url")]
    pub replicate_base_url: String,

    /// Model version used when a request does not name one
    #[serde(default)]
    pub model_version: Option<String>,

    /// Delay between status checks, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Status checks before a job is treated as timed out (at least one)
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    /// Ask the provider to cancel jobs abandoned on timeout or cancellation
    #[serde(default)]
    pub cancel_on_timeout: bool,

    /// Idle lifetime of a session entry, in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// How often expired session entries are evicted, in seconds
    #[serde(default = "default_session_sweep_interval_secs")]
    pub session_sweep_interval_secs: u64,

    /// Largest accepted upload, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_replicate_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_poll_max_attempts() -> u32 {
    60
}

fn default_session_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_session_sweep_interval_secs() -> u64 {
    300
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.poll_max_attempts.max(1),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_interval_secs.max(1))
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}
