pub mod announcer;
pub mod channel;
pub mod error;
pub mod manager;
pub mod options;
pub mod record;
pub mod scheduler;
pub mod store;
pub mod tracker;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use announcer::{Announcer, LocalActivity};
pub use channel::{channel_for_topic, topic_from_channel};
pub use error::PresenceError;
pub use manager::PresenceManager;
pub use options::PresenceOptions;
pub use record::PresenceRecord;
pub use scheduler::ExpiryScheduler;
pub use store::{PresenceKind, PresenceStore, UpsertOutcome};
pub use tracker::{PresenceSnapshot, PresenceTracker};

pub type SharedStore = Arc<Mutex<PresenceStore>>;

// A panic while holding a presence lock leaves the data usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
