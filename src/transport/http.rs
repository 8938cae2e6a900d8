use futures_util::future::{self, BoxFuture};
use futures_util::{FutureExt, StreamExt};
use reqwest::Client;
use std::time::Duration;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::{ChannelMessage, MessageStream, PresenceTransport, TransportError};
use crate::models::{BusEnvelope, PublishRequest};
use crate::presence::channel::topic_from_channel;

/// Talks to a presence relay: publishes over HTTP, subscribes over WebSocket
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn ws_url(&self, topic_id: u64, last_id: Option<i64>) -> Result<String, TransportError> {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return Err(TransportError::InvalidRequest(format!(
                "Unsupported base URL '{}'",
                self.base_url
            )));
        };
        let mut url = format!("{}/api/presence/subscribe/{}", base, topic_id);
        if let Some(last_id) = last_id {
            url.push_str(&format!("?last_id={}", last_id));
        }
        Ok(url)
    }
}

impl PresenceTransport for HttpTransport {
    fn subscribe<'a>(
        &'a self,
        channel: &'a str,
        last_id: Option<i64>,
    ) -> BoxFuture<'a, Result<MessageStream, TransportError>> {
        async move {
            let topic_id = topic_from_channel(channel)
                .ok_or_else(|| TransportError::InvalidChannel(channel.to_string()))?;

            let mut request = self.ws_url(topic_id, last_id)?.into_client_request()?;
            let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            request.headers_mut().insert(header::AUTHORIZATION, auth);

            let (socket, _response) = tokio_tungstenite::connect_async(request).await?;
            info!("Connected to presence relay for {}", channel);

            let messages = socket
                .take_while(|frame| {
                    if let Err(e) = frame {
                        warn!("Presence socket closed with error: {}", e);
                    }
                    future::ready(frame.is_ok())
                })
                .filter_map(|frame| async move {
                    match frame {
                        Ok(Message::Text(text)) => match serde_json::from_str::<BusEnvelope>(text.as_str()) {
                            Ok(envelope) => Some(ChannelMessage {
                                payload: envelope.data,
                                age: Duration::from_millis(envelope.age_ms),
                            }),
                            Err(e) => {
                                debug!("Skipping unreadable relay frame: {}", e);
                                None
                            }
                        },
                        _ => None,
                    }
                })
                .boxed();
            Ok::<MessageStream, TransportError>(messages)
        }
        .boxed()
    }

    fn publish(&self, request: PublishRequest) -> BoxFuture<'_, Result<(), TransportError>> {
        async move {
            let url = format!("{}/api/presence/publish", self.base_url);
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TransportError::Status(status.as_u16(), body));
            }
            Ok::<(), TransportError>(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_follows_http_scheme() {
        let transport = HttpTransport::new("http://localhost:3000/", "t").unwrap();
        assert_eq!(
            transport.ws_url(42, None).unwrap(),
            "ws://localhost:3000/api/presence/subscribe/42"
        );
        let secure = HttpTransport::new("https://forum.example", "t").unwrap();
        assert_eq!(
            secure.ws_url(7, Some(12)).unwrap(),
            "wss://forum.example/api/presence/subscribe/7?last_id=12"
        );
    }

    #[test]
    fn ws_url_rejects_unknown_scheme() {
        let transport = HttpTransport::new("ftp://x", "t").unwrap();
        assert!(matches!(transport.ws_url(1, None), Err(TransportError::InvalidRequest(_))));
    }
}
