use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::{lock, SharedStore};

/// Repeating prune task for one presence store.
///
/// The task slot is shared with the task itself so that a tick which empties
/// the store can put the scheduler back to idle. Lock order is slot, then store.
/// A closed scheduler refuses to start until reopened.
pub struct ExpiryScheduler {
    tick_interval: Duration,
    staleness_window: Duration,
    task: Arc<Mutex<Option<(u64, JoinHandle<()>)>>>,
    generation: AtomicU64,
    closed: AtomicBool,
}

impl ExpiryScheduler {
    pub fn new(tick_interval: Duration, staleness_window: Duration) -> Self {
        Self {
            tick_interval,
            staleness_window,
            task: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Start ticking unless already active or closed.
    pub fn ensure_started(&self, store: &SharedStore) {
        let mut slot = lock(&self.task);
        if slot.is_some() || self.is_closed() {
            return;
        }

        let store = store.clone();
        let task = self.task.clone();
        let tick = self.tick_interval;
        let window = self.staleness_window;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);

        debug!("Starting presence expiry scheduler ({:?} tick)", tick);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + tick, tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut slot = lock(&task);
                // Stopped and possibly replaced while waiting on the slot
                if !matches!(slot.as_ref(), Some((current, _)) if *current == generation) {
                    return;
                }
                let empty = lock(&store).prune_stale(Instant::now(), window);
                if empty {
                    debug!("Presence store empty, stopping expiry scheduler");
                    slot.take();
                    return;
                }
            }
        });
        *slot = Some((generation, handle));
    }

    /// Cancel the task regardless of store contents.
    pub fn stop(&self) {
        if let Some((_, handle)) = lock(&self.task).take() {
            handle.abort();
        }
    }

    /// Stop and refuse later starts. The flag is set before the slot is taken.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.stop();
    }

    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        lock(&self.task).is_some()
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PresenceUser;
    use crate::presence::store::{PresenceKind, PresenceStore};

    fn shared(max: usize) -> SharedStore {
        Arc::new(Mutex::new(PresenceStore::new(max)))
    }

    fn scheduler() -> ExpiryScheduler {
        ExpiryScheduler::new(Duration::from_millis(2_000), Duration::from_secs(12))
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn second_start_is_a_no_op() {
        let store = shared(5);
        let scheduler = scheduler();
        scheduler.ensure_started(&store);
        let first = lock(&scheduler.task).as_ref().map(|(generation, _)| *generation);
        scheduler.ensure_started(&store);
        let second = lock(&scheduler.task).as_ref().map(|(generation, _)| *generation);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn stale_record_expires_and_scheduler_goes_idle() {
        let store = shared(5);
        let scheduler = scheduler();
        lock(&store).upsert(PresenceKind::General, PresenceUser::new(5, "five"), None, Instant::now());
        scheduler.ensure_started(&store);

        tokio::time::sleep(Duration::from_millis(11_000)).await;
        assert_eq!(lock(&store).general_users().len(), 1);
        assert!(scheduler.is_active());

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert!(lock(&store).is_empty());
        assert!(!scheduler.is_active());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn stop_cancels_even_with_records_left() {
        let store = shared(5);
        let scheduler = scheduler();
        lock(&store).upsert(PresenceKind::General, PresenceUser::new(1, "one"), None, Instant::now());
        scheduler.ensure_started(&store);
        scheduler.stop();
        assert!(!scheduler.is_active());

        tokio::time::sleep(Duration::from_secs(30)).await;
        // Nothing pruned because nothing ticked
        assert_eq!(lock(&store).general_users().len(), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn closed_scheduler_stays_down_until_reopened() {
        let store = shared(5);
        let scheduler = scheduler();
        lock(&store).upsert(PresenceKind::General, PresenceUser::new(3, "three"), None, Instant::now());
        scheduler.ensure_started(&store);
        scheduler.close();
        assert!(!scheduler.is_active());

        scheduler.ensure_started(&store);
        assert!(!scheduler.is_active());

        scheduler.reopen();
        scheduler.ensure_started(&store);
        assert!(scheduler.is_active());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn restarts_after_going_idle() {
        let store = shared(5);
        let scheduler = scheduler();
        scheduler.ensure_started(&store);
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert!(!scheduler.is_active());

        lock(&store).upsert(PresenceKind::General, PresenceUser::new(2, "two"), None, Instant::now());
        scheduler.ensure_started(&store);
        assert!(scheduler.is_active());
    }
}
