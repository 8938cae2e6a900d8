pub mod error;
pub mod local;
pub mod http;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use serde_json::Value;
use std::time::Duration;

use crate::models::PublishRequest;

pub use error::TransportError;
pub use http::HttpTransport;
pub use local::LocalTransport;

/// Raw channel payload together with how long ago it was published
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelMessage {
    pub payload: Value,
    pub age: Duration,
}

/// Channel messages in publish order; dropping the stream ends the subscription
pub type MessageStream = BoxStream<'static, ChannelMessage>;

/// Publish/subscribe transport a presence manager talks through
pub trait PresenceTransport: Send + Sync {
    fn subscribe<'a>(
        &'a self,
        channel: &'a str,
        last_id: Option<i64>,
    ) -> BoxFuture<'a, Result<MessageStream, TransportError>>;

    fn publish(&self, request: PublishRequest) -> BoxFuture<'_, Result<(), TransportError>>;
}
