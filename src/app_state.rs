use std::sync::Arc;

use crate::models::ui_state::UploadLimits;
use crate::services::{
    orchestrator::JobOrchestrator, session_store::SessionStore, state_accessor::StateAccessor,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub default_model_version: Option<String>,
    pub upload_limits: UploadLimits,
}

impl AppState {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        orchestrator: JobOrchestrator,
        default_model_version: Option<String>,
        upload_limits: UploadLimits,
    ) -> Self {
        Self {
            sessions,
            orchestrator: Arc::new(orchestrator),
            default_model_version,
            upload_limits,
        }
    }

    /// Accessor bound to the identity of the current request.
    pub fn accessor(&self, user_id: Option<String>) -> StateAccessor {
        StateAccessor::new(self.sessions.clone(), user_id)
    }
}
