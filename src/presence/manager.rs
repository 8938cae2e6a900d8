use futures_util::StreamExt;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::announcer::{Announcer, LocalActivity};
use super::channel::channel_for_topic;
use super::error::PresenceError;
use super::record::PresenceRecord;
use super::tracker::{PresenceSnapshot, PresenceTracker};
use super::{lock, PresenceOptions};
use crate::transport::PresenceTransport;

/// Presence for one topic as seen by one user.
///
/// Call `subscribe` when the topic view opens and `unsubscribe` (or drop the
/// manager) when it closes.
pub struct PresenceManager {
    topic_id: u64,
    channel: String,
    tracker: Arc<PresenceTracker>,
    transport: Arc<dyn PresenceTransport>,
    announcer: Announcer,
    subscription: Mutex<Option<JoinHandle<()>>>,
}

impl PresenceManager {
    pub fn new(
        topic_id: u64,
        current_user_id: u64,
        options: PresenceOptions,
        transport: Arc<dyn PresenceTransport>,
    ) -> Result<Self, PresenceError> {
        options.validate()?;
        Ok(Self {
            topic_id,
            channel: channel_for_topic(topic_id),
            tracker: Arc::new(PresenceTracker::new(current_user_id, &options)),
            announcer: Announcer::new(topic_id, options.throttle_window, transport.clone()),
            transport,
            subscription: Mutex::new(None),
        })
    }

    pub fn topic_id(&self) -> u64 {
        self.topic_id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Start listening on the topic channel. No-op while already listening.
    pub fn subscribe(&self) {
        let mut slot = lock(&self.subscription);
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        self.tracker.reopen();
        let channel = self.channel.clone();
        let tracker = self.tracker.clone();
        let transport = self.transport.clone();
        *slot = Some(tokio::spawn(async move {
            let mut messages = match transport.subscribe(&channel, None).await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!("Presence disabled for {}: subscribe failed: {}", channel, e);
                    return;
                }
            };
            info!("Subscribed to presence channel {}", channel);
            while let Some(message) = messages.next().await {
                tracker.apply_aged(message.payload, message.age);
            }
            debug!("Presence channel {} ended", channel);
        }));
    }

    /// Stop listening, stop expiring, forget everyone and drop any throttled announce.
    ///
    /// A message the listener is applying on another worker at this moment is
    /// discarded; nothing is applied again until the next `subscribe`.
    pub fn unsubscribe(&self) {
        if let Some(handle) = lock(&self.subscription).take() {
            handle.abort();
            debug!("Unsubscribed from presence channel {}", self.channel);
        }
        self.tracker.reset();
        self.announcer.cancel_pending();
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.subscription)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Feed a payload obtained outside the transport subscription.
    pub fn apply(&self, raw: Value) {
        self.tracker.apply(raw);
    }

    pub fn throttled_announce(&self, activity: LocalActivity, is_whisper: bool) {
        self.announcer.throttled_announce(activity, is_whisper);
    }

    pub fn announce_closed(&self, post_id: Option<u64>, is_whisper: bool) {
        self.announcer.announce_closed(post_id, is_whisper);
    }

    pub fn snapshot(&self) -> PresenceSnapshot {
        self.tracker.snapshot()
    }

    pub fn replying_count(&self) -> usize {
        self.tracker.snapshot().replying.len()
    }

    pub fn editing_users_for(&self, post_id: u64) -> Vec<PresenceRecord> {
        self.tracker.editing_users_for(post_id)
    }

    pub fn is_expiring(&self) -> bool {
        self.tracker.is_expiring()
    }
}

impl Drop for PresenceManager {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
