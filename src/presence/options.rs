use std::time::Duration;

use super::error::PresenceError;
use crate::config::Config;

/// Timings and limits of a presence manager
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresenceOptions {
    pub staleness_window: Duration,
    pub tick_interval: Duration,
    pub throttle_window: Duration,
    pub max_users_shown: usize,
}

impl PresenceOptions {
    /// The scheduler must tick more often than records go stale.
    pub fn validate(&self) -> Result<(), PresenceError> {
        if self.tick_interval.is_zero() {
            return Err(PresenceError::InvalidOptions("tick interval must be positive".to_string()));
        }
        if self.tick_interval >= self.staleness_window {
            return Err(PresenceError::InvalidOptions(format!(
                "tick interval {:?} must be shorter than staleness window {:?}",
                self.tick_interval, self.staleness_window
            )));
        }
        Ok(())
    }
}

impl Default for PresenceOptions {
    fn default() -> Self {
        Self {
            staleness_window: Duration::from_secs(12),
            tick_interval: Duration::from_millis(2_000),
            throttle_window: Duration::from_millis(10_000),
            max_users_shown: 5,
        }
    }
}

impl From<&Config> for PresenceOptions {
    fn from(config: &Config) -> Self {
        Self {
            staleness_window: config.staleness_window(),
            tick_interval: config.tick_interval(),
            throttle_window: config.throttle_window(),
            max_users_shown: config.presence_max_users_shown,
        }
    }
}
