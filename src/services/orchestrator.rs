//! Submit-then-poll execution of a single generation job.
//!
//! A run moves through `Submitting → Polling → {Succeeded | Failed |
//! TimedOut | Unavailable | Cancelled}`. Nothing is retried: a rejected
//! submission or a failed status check ends the run immediately, and the
//! poll budget is the only bound against a provider that never finishes.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::models::job::{PredictionRequest, PredictionStatus};
use crate::services::provider::{InferenceProvider, ProviderError, ReplicateClient};

/// The only message end users ever see for a failed job.
pub const USER_FACING_MESSAGE: &str = "service busy, try again later";

/// Delay between status checks and the number of checks before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 60,
        }
    }
}

/// Runs generation jobs against an [`InferenceProvider`].
///
/// Holds no per-run state, so one instance serves any number of concurrent runs.
pub struct JobOrchestrator {
    provider: Arc<dyn InferenceProvider>,
    api_token: Option<String>,
    policy: PollPolicy,
    cancel_on_timeout: bool,
}

impl JobOrchestrator {
    pub fn new(
        provider: Arc<dyn InferenceProvider>,
        api_token: Option<String>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            provider,
            api_token,
            policy,
            cancel_on_timeout: false,
        }
    }

    /// Ask the provider to cancel a job this orchestrator stopped waiting for.
    pub fn with_cancel_on_timeout(mut self, enabled: bool) -> Self {
        self.cancel_on_timeout = enabled;
        self
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let provider = ReplicateClient::new(config.replicate_base_url.clone());
        Self::new(
            Arc::new(provider),
            config.replicate_api_token.clone(),
            config.poll_policy(),
        )
        .with_cancel_on_timeout(config.cancel_on_timeout)
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Submit one job and wait for its output.
    pub async fn run_job(&self, request: &PredictionRequest) -> Result<serde_json::Value, JobError> {
        self.run_job_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`run_job`](Self::run_job), but stops as soon as `cancel` fires.
    /// An in-flight submission is allowed to finish; an in-flight status
    /// check is dropped.
    pub async fn run_job_with_cancel(
        &self,
        request: &PredictionRequest,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, JobError> {
        let started = Instant::now();
        metrics::counter!("generation_jobs_total").increment(1);

        let result = self.execute(request, cancel).await;

        match &result {
            Ok(_) => {
                metrics::counter!("generation_jobs_completed").increment(1);
                metrics::histogram!("generation_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
            }
            Err(e) => {
                metrics::counter!("generation_jobs_failed", "kind" => e.kind()).increment(1);
                if matches!(e, JobError::Configuration) {
                    tracing::error!(error = %e, "Generation job refused");
                } else {
                    tracing::warn!(kind = e.kind(), error = %e, "Generation job failed");
                }
            }
        }

        result
    }

    async fn execute(
        &self,
        request: &PredictionRequest,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, JobError> {
        let api_token = self.credential().ok_or(JobError::Configuration)?;

        if cancel.is_cancelled() {
            return Err(JobError::Cancelled { job_id: None });
        }

        // Submission is not raced against `cancel`: once the provider may have
        // created the job we need its id to cancel it.
        let job_id = self
            .provider
            .create_prediction(api_token, request)
            .await
            .map_err(JobError::from_submission)?
            .id;

        tracing::info!(job_id = %job_id, version = %request.version, "Generation job submitted");

        if cancel.is_cancelled() {
            let error = JobError::Cancelled {
                job_id: Some(job_id.clone()),
            };
            return Err(self.abandon(api_token, &job_id, error).await);
        }

        for attempt in 1..=self.policy.max_attempts {
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                res = async {
                    sleep(self.policy.interval).await;
                    self.provider.get_prediction(api_token, &job_id).await
                } => Some(res),
            };

            let Some(polled) = polled else {
                let error = JobError::Cancelled {
                    job_id: Some(job_id.clone()),
                };
                return Err(self.abandon(api_token, &job_id, error).await);
            };

            let prediction = polled.map_err(|source| JobError::Unavailable {
                job_id: job_id.clone(),
                source,
            })?;

            match prediction.status {
                PredictionStatus::Succeeded => {
                    tracing::info!(job_id = %job_id, attempt, "Generation job succeeded");
                    return Ok(prediction.output.unwrap_or(serde_json::Value::Null));
                }
                PredictionStatus::Failed => {
                    return Err(JobError::JobFailed {
                        job_id,
                        reason: prediction
                            .error
                            .map(describe_provider_error)
                            .unwrap_or_else(|| "no reason given".to_string()),
                    });
                }
                status => {
                    tracing::debug!(job_id = %job_id, attempt, status = %status, "Generation job still running");
                }
            }
        }

        let error = JobError::Timeout {
            job_id: job_id.clone(),
            attempts: self.policy.max_attempts,
        };
        Err(self.abandon(api_token, &job_id, error).await)
    }

    /// Best-effort provider cleanup for a job we stopped waiting on. Never
    /// replaces the error that ended the run.
    async fn abandon(&self, api_token: &str, job_id: &str, error: JobError) -> JobError {
        if self.cancel_on_timeout {
            match self.provider.cancel_prediction(api_token, job_id).await {
                Ok(()) => tracing::info!(job_id = %job_id, "Cancelled abandoned generation job"),
                Err(e) => {
                    tracing::warn!(job_id = %job_id, error = %e, "Failed to cancel abandoned generation job")
                }
            }
        }
        error
    }

    fn credential(&self) -> Option<&str> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

fn describe_provider_error(error: serde_json::Value) -> String {
    match error {
        serde_json::Value::String(message) => message,
        other => other.to_string(),
    }
}

#[derive(Debug, thiserror::Error, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum JobError {
    #[error("Inference provider credential is not configured")]
    Configuration,

    #[error("Provider rejected the job: {body}")]
    Submission { status: Option<u16>, body: String },

    #[error("Status check for job {job_id} failed: {source}")]
    Unavailable {
        job_id: String,
        source: ProviderError,
    },

    #[error("Job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    #[error("Job {job_id} did not finish within {attempts} status checks")]
    Timeout { job_id: String, attempts: u32 },

    #[error("Job run was cancelled")]
    Cancelled { job_id: Option<String> },
}

impl JobError {
    /// Stable error kind for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Message safe to show end users; provider details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        USER_FACING_MESSAGE
    }

    fn from_submission(error: ProviderError) -> Self {
        match error {
            ProviderError::Api { status, body } => JobError::Submission {
                status: Some(status),
                body,
            },
            ProviderError::Http(e) => JobError::Submission {
                status: None,
                body: e.to_string(),
            },
        }
    }
}
