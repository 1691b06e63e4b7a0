use std::sync::Arc;

use crate::models::ui_state::{UiState, UiStateField};
use crate::services::session_store::SessionStore;

/// A caller's view of the session store, bound to the identity resolved
/// for the current request.
///
/// Without an identity every write is skipped and reads return an empty
/// state, so a page can render before authentication has settled. Every
/// call goes straight to the store; nothing is cached between calls.
#[derive(Clone)]
pub struct StateAccessor {
    store: Arc<dyn SessionStore>,
    user_id: Option<String>,
}

impl StateAccessor {
    pub fn new(store: Arc<dyn SessionStore>, user_id: Option<String>) -> Self {
        Self { store, user_id }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub async fn state(&self) -> UiState {
        match self.user_id() {
            Some(user_id) => self.store.get_state(user_id).await,
            None => UiState::default(),
        }
    }

    pub async fn update_state(&self, patch: UiState) {
        let Some(user_id) = self.user_id() else {
            tracing::trace!("No identity bound, skipping state update");
            return;
        };
        self.store.set_state(user_id, patch).await;
    }

    pub async fn update_state_property(&self, field: UiStateField) {
        let Some(user_id) = self.user_id() else {
            tracing::trace!(key = %field.key(), "No identity bound, skipping property update");
            return;
        };
        self.store.update_property(user_id, field).await;
    }

    pub async fn clear_state(&self) {
        if let Some(user_id) = self.user_id() {
            self.store.clear_state(user_id).await;
        }
    }
}
