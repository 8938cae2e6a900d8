use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::record::PresenceRecord;
use super::scheduler::ExpiryScheduler;
use super::store::{PresenceKind, PresenceStore, UpsertOutcome};
use super::{lock, PresenceOptions, SharedStore};
use crate::models::{ActivityState, PresenceMessage};

/// Copy of the store contents for rendering
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresenceSnapshot {
    pub replying: Vec<PresenceRecord>,
    pub editing: Vec<PresenceRecord>,
}

impl PresenceSnapshot {
    pub fn replying_ids(&self) -> Vec<u64> {
        self.replying.iter().map(|r| r.user.id).collect()
    }

    pub fn editing_ids(&self) -> Vec<u64> {
        self.editing.iter().map(|r| r.user.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.replying.is_empty() && self.editing.is_empty()
    }
}

/// Applies channel messages from other users to the store and keeps the
/// expiry scheduler running while anyone is present.
///
/// After `reset` the tracker is closed: late messages are dropped and the
/// scheduler stays down until `reopen`.
pub struct PresenceTracker {
    current_user_id: u64,
    staleness_window: Duration,
    store: SharedStore,
    scheduler: ExpiryScheduler,
}

impl PresenceTracker {
    pub fn new(current_user_id: u64, options: &PresenceOptions) -> Self {
        Self {
            current_user_id,
            staleness_window: options.staleness_window,
            store: Arc::new(Mutex::new(PresenceStore::new(options.max_users_shown))),
            scheduler: ExpiryScheduler::new(options.tick_interval, options.staleness_window),
        }
    }

    /// Apply a raw channel payload received just now.
    pub fn apply(&self, raw: Value) {
        self.apply_aged(raw, Duration::ZERO);
    }

    /// Apply a raw channel payload published `age` ago. Payloads that do not
    /// parse are dropped.
    pub fn apply_aged(&self, raw: Value, age: Duration) {
        match serde_json::from_value::<PresenceMessage>(raw) {
            Ok(message) => self.handle(message, age),
            Err(e) => debug!("Ignoring malformed presence message: {}", e),
        }
    }

    pub fn handle(&self, message: PresenceMessage, age: Duration) {
        if message.user.id == self.current_user_id {
            return;
        }

        // Replayed heartbeats count from when they were sent
        let seen_at = match Instant::now().checked_sub(age) {
            Some(seen_at) if age < self.staleness_window => seen_at,
            _ if message.state != ActivityState::Closed => {
                debug!("Ignoring presence of user {} sent {:?} ago", message.user.id, age);
                return;
            }
            _ => Instant::now(),
        };

        let outcome = {
            let mut store = lock(&self.store);
            if self.scheduler.is_closed() {
                return;
            }
            match message.state {
                ActivityState::Replying => {
                    store.upsert(PresenceKind::General, message.user, None, seen_at)
                }
                ActivityState::Editing => {
                    store.upsert(PresenceKind::Editing, message.user, message.post_id, seen_at)
                }
                ActivityState::Closed => {
                    store.remove(message.user.id);
                    return;
                }
            }
        };

        if outcome == UpsertOutcome::Inserted {
            self.scheduler.ensure_started(&self.store);
        }
    }

    /// Stop expiring, forget everyone and ignore messages until reopened.
    pub fn reset(&self) {
        self.scheduler.close();
        lock(&self.store).clear();
    }

    pub fn reopen(&self) {
        self.scheduler.reopen();
    }

    pub fn snapshot(&self) -> PresenceSnapshot {
        let store = lock(&self.store);
        PresenceSnapshot {
            replying: store.general_users().to_vec(),
            editing: store.editing_users().to_vec(),
        }
    }

    pub fn editing_users_for(&self, post_id: u64) -> Vec<PresenceRecord> {
        lock(&self.store).editing_users_for(post_id).cloned().collect()
    }

    pub fn is_expiring(&self) -> bool {
        self.scheduler.is_active()
    }
}
