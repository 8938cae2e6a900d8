use std::time::Duration;
use tokio::time::Instant;

use super::record::PresenceRecord;
use crate::models::PresenceUser;

/// Which collection an upsert targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceKind {
    General,
    Editing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Refreshed,
    /// New user turned away because the scope is full
    Rejected,
}

/// Users currently replying to or editing in one topic.
///
/// Both collections keep insertion order and hold at most one record per user id.
#[derive(Debug)]
pub struct PresenceStore {
    general: Vec<PresenceRecord>,
    editing: Vec<PresenceRecord>,
    max_users_shown: usize,
}

impl PresenceStore {
    pub fn new(max_users_shown: usize) -> Self {
        Self {
            general: Vec::new(),
            editing: Vec::new(),
            max_users_shown,
        }
    }

    /// Insert a user or refresh their `last_seen_at`.
    ///
    /// Editing capacity is counted per post. Existing users always refresh,
    /// even when the scope is full.
    pub fn upsert(
        &mut self,
        kind: PresenceKind,
        user: PresenceUser,
        post_id: Option<u64>,
        now: Instant,
    ) -> UpsertOutcome {
        let records = match kind {
            PresenceKind::General => &mut self.general,
            PresenceKind::Editing => &mut self.editing,
        };

        if let Some(existing) = records.iter_mut().find(|r| r.user.id == user.id) {
            existing.user = user;
            existing.last_seen_at = now;
            if kind == PresenceKind::Editing {
                existing.post_id = post_id;
            }
            return UpsertOutcome::Refreshed;
        }

        let admitted = match kind {
            PresenceKind::General => records.len(),
            PresenceKind::Editing => records.iter().filter(|r| r.post_id == post_id).count(),
        };
        if admitted >= self.max_users_shown {
            return UpsertOutcome::Rejected;
        }

        let post_id = match kind {
            PresenceKind::General => None,
            PresenceKind::Editing => post_id,
        };
        records.push(PresenceRecord::new(user, post_id, now));
        UpsertOutcome::Inserted
    }

    /// Remove a user from both collections. Returns whether anything was removed.
    pub fn remove(&mut self, user_id: u64) -> bool {
        let before = self.len();
        self.general.retain(|r| r.user.id != user_id);
        self.editing.retain(|r| r.user.id != user_id);
        self.len() != before
    }

    /// Drop every record at least `window` old. Returns whether the store is now empty.
    pub fn prune_stale(&mut self, now: Instant, window: Duration) -> bool {
        self.general.retain(|r| !r.is_stale(now, window));
        self.editing.retain(|r| !r.is_stale(now, window));
        self.is_empty()
    }

    pub fn clear(&mut self) {
        self.general.clear();
        self.editing.clear();
    }

    pub fn general_users(&self) -> &[PresenceRecord] {
        &self.general
    }

    pub fn editing_users(&self) -> &[PresenceRecord] {
        &self.editing
    }

    pub fn editing_users_for(&self, post_id: u64) -> impl Iterator<Item = &PresenceRecord> + '_ {
        self.editing.iter().filter(move |r| r.post_id == Some(post_id))
    }

    pub fn is_empty(&self) -> bool {
        self.general.is_empty() && self.editing.is_empty()
    }

    pub fn len(&self) -> usize {
        self.general.len() + self.editing.len()
    }

    pub fn max_users_shown(&self) -> usize {
        self.max_users_shown
    }
}
