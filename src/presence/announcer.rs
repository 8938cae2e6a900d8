use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::lock;
use crate::models::{ActivityState, PublishRequest};
use crate::transport::PresenceTransport;

/// What the local user is doing that is worth announcing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalActivity {
    Replying,
    Editing(u64),
}

#[derive(Default)]
struct Pending {
    request: Option<PublishRequest>,
    timer: Option<(u64, JoinHandle<()>)>,
}

/// Trailing-edge throttled publisher for the local user's state
pub struct Announcer {
    topic_id: u64,
    throttle_window: Duration,
    transport: Arc<dyn PresenceTransport>,
    pending: Arc<Mutex<Pending>>,
    generation: AtomicU64,
}

impl Announcer {
    pub fn new(topic_id: u64, throttle_window: Duration, transport: Arc<dyn PresenceTransport>) -> Self {
        Self {
            topic_id,
            throttle_window,
            transport,
            pending: Arc::new(Mutex::new(Pending::default())),
            generation: AtomicU64::new(0),
        }
    }

    /// Queue an announce. Calls inside one window collapse into a single
    /// publish carrying the latest parameters, sent when the window ends.
    pub fn throttled_announce(&self, activity: LocalActivity, is_whisper: bool) {
        let (state, post_id) = match activity {
            LocalActivity::Replying => (ActivityState::Replying, None),
            LocalActivity::Editing(post_id) => (ActivityState::Editing, Some(post_id)),
        };
        let request = PublishRequest {
            state,
            topic_id: self.topic_id,
            post_id,
            is_whisper,
        };

        let mut pending = lock(&self.pending);
        pending.request = Some(request);
        if pending.timer.is_some() {
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let shared = self.pending.clone();
        let transport = self.transport.clone();
        let window = self.throttle_window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let request = {
                let mut pending = lock(&shared);
                if !matches!(pending.timer.as_ref(), Some((current, _)) if *current == generation) {
                    return;
                }
                pending.timer = None;
                pending.request.take()
            };
            if let Some(request) = request {
                send(transport.as_ref(), request).await;
            }
        });
        pending.timer = Some((generation, handle));
    }

    /// Publish `closed` right away, dropping anything still throttled.
    pub fn announce_closed(&self, post_id: Option<u64>, is_whisper: bool) {
        self.cancel_pending();
        let request = PublishRequest {
            state: ActivityState::Closed,
            topic_id: self.topic_id,
            post_id,
            is_whisper,
        };
        let transport = self.transport.clone();
        tokio::spawn(async move {
            send(transport.as_ref(), request).await;
        });
    }

    pub fn cancel_pending(&self) {
        let mut pending = lock(&self.pending);
        pending.request = None;
        if let Some((_, handle)) = pending.timer.take() {
            handle.abort();
        }
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.pending).request.is_some()
    }
}

impl Drop for Announcer {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

// Best effort: the next heartbeat repairs a lost one.
async fn send(transport: &dyn PresenceTransport, request: PublishRequest) {
    let state = request.state;
    let topic_id = request.topic_id;
    match transport.publish(request).await {
        Ok(()) => debug!("Announced {:?} on topic {}", state, topic_id),
        Err(e) => warn!("Failed to announce {:?} on topic {}: {}", state, topic_id, e),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transport::{MessageStream, TransportError};
    use futures_util::future::BoxFuture;
    use futures_util::{stream, FutureExt, StreamExt};

    /// Records publishes; optionally fails every one of them
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub published: Mutex<Vec<PublishRequest>>,
        pub fail: bool,
    }

    impl PresenceTransport for RecordingTransport {
        fn subscribe<'a>(
            &'a self,
            _channel: &'a str,
            _last_id: Option<i64>,
        ) -> BoxFuture<'a, Result<MessageStream, TransportError>> {
            async { Ok::<MessageStream, TransportError>(stream::pending().boxed()) }.boxed()
        }

        fn publish(&self, request: PublishRequest) -> BoxFuture<'_, Result<(), TransportError>> {
            async move {
                self.published.lock().unwrap().push(request);
                if self.fail {
                    return Err(TransportError::Status(500, "boom".to_string()));
                }
                Ok::<(), TransportError>(())
            }
            .boxed()
        }
    }

    fn setup() -> (Arc<RecordingTransport>, Announcer) {
        let transport = Arc::new(RecordingTransport::default());
        let announcer = Announcer::new(42, Duration::from_millis(10_000), transport.clone());
        (transport, announcer)
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn burst_collapses_into_one_trailing_publish() {
        let (transport, announcer) = setup();
        announcer.throttled_announce(LocalActivity::Replying, false);
        for post_id in 1..=4 {
            tokio::time::sleep(Duration::from_millis(200)).await;
            announcer.throttled_announce(LocalActivity::Editing(post_id), false);
        }

        tokio::time::sleep(Duration::from_millis(9_000)).await;
        assert!(transport.published.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        let published = transport.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].state, ActivityState::Editing);
        assert_eq!(published[0].post_id, Some(4));
        assert_eq!(published[0].topic_id, 42);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn next_window_publishes_again() {
        let (transport, announcer) = setup();
        announcer.throttled_announce(LocalActivity::Replying, false);
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        announcer.throttled_announce(LocalActivity::Replying, true);
        tokio::time::sleep(Duration::from_millis(10_500)).await;

        let published = transport.published.lock().unwrap();
        assert_eq!(published.len(), 2);
        assert!(published[1].is_whisper);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn closed_bypasses_and_cancels_throttle() {
        let (transport, announcer) = setup();
        announcer.throttled_announce(LocalActivity::Replying, false);
        announcer.announce_closed(None, false);
        tokio::time::sleep(Duration::from_millis(1)).await;
        {
            let published = transport.published.lock().unwrap();
            assert_eq!(published.len(), 1);
            assert_eq!(published[0].state, ActivityState::Closed);
        }
        assert!(!announcer.has_pending());

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(transport.published.lock().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn publish_failure_is_swallowed() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..RecordingTransport::default()
        });
        let announcer = Announcer::new(1, Duration::from_millis(100), transport.clone());
        announcer.throttled_announce(LocalActivity::Replying, false);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(transport.published.lock().unwrap().len(), 1);
        assert!(!announcer.has_pending());

        // Still usable after a failure
        announcer.throttled_announce(LocalActivity::Replying, false);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(transport.published.lock().unwrap().len(), 2);
    }
}
