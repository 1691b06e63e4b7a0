use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::models::ui_state::{UiState, UiStateField};

/// Volatile per-user UI state.
///
/// Implementations never fail: a missing entry reads as an empty
/// [`UiState`], and clearing a missing entry does nothing. Each call is
/// atomic on its own; a read followed by a write from the same caller is not.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_state(&self, user_id: &str) -> UiState;

    /// Merge `patch` into the user's entry, creating it if needed.
    async fn set_state(&self, user_id: &str, patch: UiState);

    async fn update_property(&self, user_id: &str, field: UiStateField) {
        self.set_state(user_id, field.into()).await;
    }

    async fn clear_state(&self, user_id: &str);

    /// Time of the last write to the user's entry, if it exists.
    async fn last_updated(&self, user_id: &str) -> Option<DateTime<Utc>>;

    async fn entry_count(&self) -> usize;
}

#[derive(Debug)]
struct SessionEntry {
    state: UiState,
    touched: Instant,
    updated_at: DateTime<Utc>,
}

impl SessionEntry {
    fn new(state: UiState) -> Self {
        Self {
            state,
            touched: Instant::now(),
            updated_at: Utc::now(),
        }
    }
}

/// In-process store backed by a sharded concurrent map.
///
/// Entries idle for longer than the TTL read as absent and are removed by
/// [`sweep_expired`](Self::sweep_expired).
pub struct InMemorySessionStore {
    entries: DashMap<String, SessionEntry>,
    ttl: Option<Duration>,
}

impl InMemorySessionStore {
    /// Store whose entries never expire.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            ttl: None,
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Some(ttl),
        }
    }

    fn is_expired(&self, entry: &SessionEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.touched.elapsed() >= ttl)
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !self.is_expired(entry));
        let removed = before.saturating_sub(self.entries.len());
        self.record_size();
        removed
    }

    /// Entries that have not expired, whether or not they have been swept.
    fn live_count(&self) -> usize {
        match self.ttl {
            None => self.entries.len(),
            Some(_) => self
                .entries
                .iter()
                .filter(|entry| !self.is_expired(entry.value()))
                .count(),
        }
    }

    fn record_size(&self) {
        metrics::gauge!("session_entries").set(self.live_count() as f64);
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_state(&self, user_id: &str) -> UiState {
        self.entries
            .get(user_id)
            .filter(|entry| !self.is_expired(entry))
            .map(|entry| entry.state.clone())
            .unwrap_or_default()
    }

    async fn set_state(&self, user_id: &str, patch: UiState) {
        match self.entries.entry(user_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let expired = self.is_expired(occupied.get());
                let entry = occupied.get_mut();
                let base = if expired {
                    UiState::default()
                } else {
                    std::mem::take(&mut entry.state)
                };
                entry.state = base.merge(patch);
                entry.touched = Instant::now();
                entry.updated_at = Utc::now();
            }
            Entry::Vacant(vacant) => {
                vacant.insert(SessionEntry::new(patch));
            }
        }
        self.record_size();
    }

    async fn clear_state(&self, user_id: &str) {
        if self.entries.remove(user_id).is_some() {
            tracing::debug!(user_id = %user_id, "Cleared session state");
        }
        self.record_size();
    }

    async fn last_updated(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.entries
            .get(user_id)
            .filter(|entry| !self.is_expired(entry))
            .map(|entry| entry.updated_at)
    }

    async fn entry_count(&self) -> usize {
        self.live_count()
    }
}

/// Periodically evict expired entries until `shutdown` fires.
pub fn spawn_sweeper(
    store: Arc<InMemorySessionStore>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = store.sweep_expired();
                    if removed > 0 {
                        tracing::info!(removed, "Evicted expired session entries");
                    }
                }
            }
        }
    })
}
