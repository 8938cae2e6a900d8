use tokio_tungstenite::tungstenite;

#[derive(Debug)]
pub enum TransportError {
    Http(reqwest::Error),
    WebSocket(tungstenite::Error),
    /// Non-success reply from the relay
    Status(u16, String),
    InvalidChannel(String),
    InvalidRequest(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Http(e) => write!(f, "HTTP error: {}", e),
            TransportError::WebSocket(e) => write!(f, "WebSocket error: {}", e),
            TransportError::Status(code, body) => write!(f, "Relay responded {}: {}", code, body),
            TransportError::InvalidChannel(channel) => write!(f, "Invalid presence channel '{}'", channel),
            TransportError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Http(e) => Some(e),
            TransportError::WebSocket(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Http(e)
    }
}

impl From<tungstenite::Error> for TransportError {
    fn from(e: tungstenite::Error) -> Self {
        TransportError::WebSocket(e)
    }
}
