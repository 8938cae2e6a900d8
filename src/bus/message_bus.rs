use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::models::BusEnvelope;

const LIVE_CAPACITY: usize = 256;

/// Who may receive a bus message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Audience {
    All,
    Staff,
}

#[derive(Clone, Debug)]
pub struct BusMessage {
    pub id: i64,
    pub channel: String,
    pub audience: Audience,
    pub published_at: Instant,
    pub payload: Value,
}

impl BusMessage {
    pub fn visible_to(&self, is_staff: bool) -> bool {
        match self.audience {
            Audience::All => true,
            Audience::Staff => is_staff,
        }
    }

    /// Time since publish as seen at `now`
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.published_at)
    }

    pub fn envelope(&self, now: Instant) -> BusEnvelope {
        BusEnvelope {
            id: self.id,
            channel: self.channel.clone(),
            data: self.payload.clone(),
            age_ms: u64::try_from(self.age(now).as_millis()).unwrap_or(u64::MAX),
        }
    }
}

struct ChannelState {
    sender: broadcast::Sender<BusMessage>,
    backlog: VecDeque<BusMessage>,
}

impl ChannelState {
    fn new() -> Self {
        let (sender, _rx) = broadcast::channel(LIVE_CAPACITY);
        Self {
            sender,
            backlog: VecDeque::new(),
        }
    }

    fn trim(&mut self, now: Instant, max_age: Duration, max_size: usize) {
        while self
            .backlog
            .front()
            .is_some_and(|m| now.saturating_duration_since(m.published_at) >= max_age)
        {
            self.backlog.pop_front();
        }
        while self.backlog.len() > max_size {
            self.backlog.pop_front();
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusStats {
    pub channels: usize,
    pub subscribers: usize,
}

/// In-process publish/subscribe hub with a short per-channel backlog.
///
/// Ids are global and strictly increasing. Publishing and subscribing both
/// take the write lock, so a subscriber sees every message exactly once:
/// either replayed from the backlog or delivered live.
pub struct MessageBus {
    channels: RwLock<HashMap<String, ChannelState>>,
    next_id: AtomicI64,
    max_backlog_age: Duration,
    max_backlog_size: usize,
}

impl MessageBus {
    pub fn new(max_backlog_age: Duration, max_backlog_size: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            max_backlog_age,
            max_backlog_size,
        }
    }

    pub async fn publish(&self, channel: &str, payload: Value, audience: Audience) -> i64 {
        let now = Instant::now();
        let mut channels = self.channels.write().await;
        self.sweep(&mut channels, now);

        let message = BusMessage {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            channel: channel.to_string(),
            audience,
            published_at: now,
            payload,
        };
        let id = message.id;

        let state = channels
            .entry(channel.to_string())
            .or_insert_with(ChannelState::new);
        state.backlog.push_back(message.clone());
        state.trim(now, self.max_backlog_age, self.max_backlog_size);

        // No live receivers is fine, the backlog still has it
        let delivered = state.sender.send(message).unwrap_or(0);
        debug!("Published message {} on {} to {} subscribers", id, channel, delivered);
        id
    }

    /// Subscribe to a channel, replaying backlog entries newer than `last_id`.
    pub async fn subscribe(&self, channel: &str, last_id: Option<i64>) -> BusSubscription {
        let now = Instant::now();
        let mut channels = self.channels.write().await;
        self.sweep(&mut channels, now);
        let state = channels
            .entry(channel.to_string())
            .or_insert_with(ChannelState::new);

        let backlog = state
            .backlog
            .iter()
            .filter(|m| last_id.map_or(true, |last| m.id > last))
            .cloned()
            .collect();

        BusSubscription {
            channel: channel.to_string(),
            backlog,
            receiver: state.sender.subscribe(),
        }
    }

    pub async fn stats(&self) -> BusStats {
        let channels = self.channels.read().await;
        BusStats {
            channels: channels.len(),
            subscribers: channels.values().map(|c| c.sender.receiver_count()).sum(),
        }
    }

    fn sweep(&self, channels: &mut HashMap<String, ChannelState>, now: Instant) {
        let (max_age, max_size) = (self.max_backlog_age, self.max_backlog_size);
        channels.retain(|_, state| {
            state.trim(now, max_age, max_size);
            state.sender.receiver_count() > 0 || !state.backlog.is_empty()
        });
    }
}

/// Backlog replay followed by live delivery for one channel
pub struct BusSubscription {
    channel: String,
    backlog: VecDeque<BusMessage>,
    receiver: broadcast::Receiver<BusMessage>,
}

impl BusSubscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub async fn next(&mut self) -> Option<BusMessage> {
        if let Some(message) = self.backlog.pop_front() {
            return Some(message);
        }
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscriber on {} lagged, skipped {} messages", self.channel, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
