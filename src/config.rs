use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Relay and presence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HS256 secret used to verify user tokens
    pub auth_jwt_secret: Option<String>,

    /// Age after which a presence record is dropped
    #[serde(default = "default_staleness_window_secs")]
    pub presence_staleness_window_secs: u64,

    /// Cadence of the expiry scheduler
    #[serde(default = "default_tick_interval_ms")]
    pub presence_tick_interval_ms: u64,

    /// Minimum spacing between two announces of the local user
    #[serde(default = "default_throttle_ms")]
    pub presence_throttle_ms: u64,

    /// Users shown per topic (or per post when editing)
    #[serde(default = "default_max_users_shown")]
    pub presence_max_users_shown: usize,

    // Message bus backlog
    #[serde(default = "default_backlog_age_secs")]
    pub bus_max_backlog_age_secs: u64,
    #[serde(default = "default_backlog_size")]
    pub bus_max_backlog_size: usize,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            dotenvy::dotenv().ok();
        }

        envy::from_env::<Config>().map_err(ConfigError::EnvError)
    }

    /// Filter used when `RUST_LOG` is unset; `log_level` applies to every other target
    pub fn log_filter(&self) -> String {
        format!(
            "topic_presence=debug,tower_http=debug,axum::rejection=trace,{}",
            self.log_level
        )
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "dev" || env == "development"
    }

    pub fn staleness_window(&self) -> Duration {
        Duration::from_secs(self.presence_staleness_window_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.presence_tick_interval_ms)
    }

    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.presence_throttle_ms)
    }

    pub fn max_backlog_age(&self) -> Duration {
        Duration::from_secs(self.bus_max_backlog_age_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            auth_jwt_secret: None,
            presence_staleness_window_secs: default_staleness_window_secs(),
            presence_tick_interval_ms: default_tick_interval_ms(),
            presence_throttle_ms: default_throttle_ms(),
            presence_max_users_shown: default_max_users_shown(),
            bus_max_backlog_age_secs: default_backlog_age_secs(),
            bus_max_backlog_size: default_backlog_size(),
        }
    }
}

/// Install the process-wide configuration. Later calls are ignored.
pub fn init_config(config: Config) -> &'static Config {
    CONFIG.get_or_init(|| config)
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

// Keep-alive of 10s plus a 2s buffer
fn default_staleness_window_secs() -> u64 {
    12
}

fn default_tick_interval_ms() -> u64 {
    2_000
}

fn default_throttle_ms() -> u64 {
    10_000
}

fn default_max_users_shown() -> usize {
    5
}

fn default_backlog_age_secs() -> u64 {
    10
}

fn default_backlog_size() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_presence_timings() {
        let config = Config::default();
        assert_eq!(config.staleness_window(), Duration::from_secs(12));
        assert_eq!(config.tick_interval(), Duration::from_millis(2_000));
        assert_eq!(config.throttle_window(), Duration::from_millis(10_000));
        assert_eq!(config.presence_max_users_shown, 5);
        assert!(config.is_development());
    }

    #[test]
    fn server_address_joins_host_and_port() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.server_address(), "127.0.0.1:8080");
    }

    #[test]
    fn log_level_feeds_the_fallback_filter() {
        let config = Config {
            log_level: "warn".to_string(),
            ..Config::default()
        };
        assert!(config.log_filter().ends_with(",warn"));
        assert!(Config::default().log_filter().ends_with(",info"));
    }
}
