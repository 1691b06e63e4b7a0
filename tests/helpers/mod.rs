//! Test helper utilities: a scripted inference provider and app wiring.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use autoshot_core::{
    app_state::AppState,
    models::job::{Prediction, PredictionRequest, PredictionStatus},
    models::ui_state::UploadLimits,
    services::{
        orchestrator::{JobOrchestrator, PollPolicy},
        provider::{InferenceProvider, ProviderError},
        session_store::InMemorySessionStore,
    },
};

pub const JOB_ID: &str = "pred-123";
pub const TEST_TOKEN: &str = "r8_test_token";

/// What the provider answers to one status check.
#[derive(Debug, Clone)]
pub enum PollStep {
    Running,
    Succeeded(serde_json::Value),
    Failed(&'static str),
    Unavailable,
}

/// Provider that replays a fixed script of status answers and counts calls.
///
/// Once the script runs out every further check answers `processing`.
pub struct ScriptedProvider {
    reject_submission: Option<(u16, String)>,
    cancel_on_submit: Option<CancellationToken>,
    polls: Mutex<VecDeque<PollStep>>,
    pub submit_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub submitted: Mutex<Vec<PredictionRequest>>,
}

impl ScriptedProvider {
    pub fn new(polls: impl IntoIterator<Item = PollStep>) -> Self {
        Self {
            reject_submission: None,
            cancel_on_submit: None,
            polls: Mutex::new(polls.into_iter().collect()),
            submit_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn always_running() -> Self {
        Self::new([])
    }

    pub fn rejecting(status: u16, body: &str) -> Self {
        Self {
            reject_submission: Some((status, body.to_string())),
            ..Self::new([])
        }
    }

    /// Fire `token` while the submission request is in flight.
    pub fn cancelling_on_submit(mut self, token: CancellationToken) -> Self {
        self.cancel_on_submit = Some(token);
        self
    }

    pub fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    fn prediction(status: PredictionStatus) -> Prediction {
        Prediction {
            id: JOB_ID.to_string(),
            status,
            output: None,
            error: None,
        }
    }
}

#[async_trait]
impl InferenceProvider for ScriptedProvider {
    async fn create_prediction(
        &self,
        _api_token: &str,
        request: &PredictionRequest,
    ) -> Result<Prediction, ProviderError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(request.clone());
        if let Some(token) = &self.cancel_on_submit {
            token.cancel();
        }
        match &self.reject_submission {
            Some((status, body)) => Err(ProviderError::Api {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(Self::prediction(PredictionStatus::Starting)),
        }
    }

    async fn get_prediction(&self, _api_token: &str, id: &str) -> Result<Prediction, ProviderError> {
        assert_eq!(id, JOB_ID);
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.polls.lock().unwrap().pop_front().unwrap_or(PollStep::Running);
        match step {
            PollStep::Running => Ok(Self::prediction(PredictionStatus::Processing)),
            PollStep::Succeeded(output) => Ok(Prediction {
                output: Some(output),
                ..Self::prediction(PredictionStatus::Succeeded)
            }),
            PollStep::Failed(reason) => Ok(Prediction {
                error: Some(serde_json::Value::String(reason.to_string())),
                ..Self::prediction(PredictionStatus::Failed)
            }),
            PollStep::Unavailable => Err(ProviderError::Api {
                status: 503,
                body: "upstream connect error".to_string(),
            }),
        }
    }

    async fn cancel_prediction(&self, _api_token: &str, id: &str) -> Result<(), ProviderError> {
        assert_eq!(id, JOB_ID);
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Poll policy with no delay, for tests that do not care about timing.
pub fn instant_policy(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::ZERO,
        max_attempts,
    }
}

pub fn orchestrator(provider: Arc<ScriptedProvider>, policy: PollPolicy) -> JobOrchestrator {
    JobOrchestrator::new(provider, Some(TEST_TOKEN.to_string()), policy)
}

pub fn sample_request() -> PredictionRequest {
    PredictionRequest {
        version: "car-diffusion-v2".to_string(),
        input: serde_json::json!({"prompt": "red coupe on a mountain road"}),
    }
}

/// App state wired to a scripted provider and an in-memory store.
pub fn app_state(provider: Arc<ScriptedProvider>) -> (AppState, Arc<InMemorySessionStore>) {
    let sessions = Arc::new(InMemorySessionStore::new());
    let state = AppState::new(
        sessions.clone(),
        orchestrator(provider, instant_policy(5)),
        Some("car-diffusion-v2".to_string()),
        UploadLimits::default(),
    );
    (state, sessions)
}
