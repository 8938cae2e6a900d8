use tokio::time::Instant;

use crate::models::PresenceUser;

/// One user seen on a topic
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresenceRecord {
    pub user: PresenceUser,
    pub last_seen_at: Instant,
    /// Post being edited; `None` for topic-level presence
    pub post_id: Option<u64>,
}

impl PresenceRecord {
    pub fn new(user: PresenceUser, post_id: Option<u64>, now: Instant) -> Self {
        Self {
            user,
            last_seen_at: now,
            post_id,
        }
    }

    pub fn user_id(&self) -> u64 {
        self.user.id
    }

    pub fn is_stale(&self, now: Instant, window: std::time::Duration) -> bool {
        now.saturating_duration_since(self.last_seen_at) >= window
    }
}
