#[derive(Debug)]
pub enum PresenceError {
    /// Options that would let records outlive the scheduler
    InvalidOptions(String),
}

impl std::fmt::Display for PresenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresenceError::InvalidOptions(msg) => write!(f, "Invalid presence options: {}", msg),
        }
    }
}

impl std::error::Error for PresenceError {}
