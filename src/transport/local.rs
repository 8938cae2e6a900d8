use futures_util::future::BoxFuture;
use futures_util::{stream, FutureExt, StreamExt};
use std::sync::Arc;
use tokio::time::Instant;

use super::{ChannelMessage, MessageStream, PresenceTransport, TransportError};
use crate::auth::auth::AuthUser;
use crate::bus::MessageBus;
use crate::models::PublishRequest;
use crate::services::presence_service;

/// Transport bound directly to an in-process message bus, acting as one user
#[derive(Clone)]
pub struct LocalTransport {
    bus: Arc<MessageBus>,
    user: AuthUser,
}

impl LocalTransport {
    pub fn new(bus: Arc<MessageBus>, user: AuthUser) -> Self {
        Self { bus, user }
    }
}

impl PresenceTransport for LocalTransport {
    fn subscribe<'a>(
        &'a self,
        channel: &'a str,
        last_id: Option<i64>,
    ) -> BoxFuture<'a, Result<MessageStream, TransportError>> {
        async move {
            let subscription = self.bus.subscribe(channel, last_id).await;
            let is_staff = self.user.is_staff;
            let messages = stream::unfold(subscription, |mut sub| async move {
                sub.next().await.map(|msg| (msg, sub))
            })
            .filter_map(move |msg| async move {
                let age = msg.age(Instant::now());
                msg.visible_to(is_staff).then_some(ChannelMessage {
                    payload: msg.payload,
                    age,
                })
            })
            .boxed();
            Ok::<MessageStream, TransportError>(messages)
        }
        .boxed()
    }

    fn publish(&self, request: PublishRequest) -> BoxFuture<'_, Result<(), TransportError>> {
        async move {
            presence_service::publish_presence(&self.bus, &self.user, request)
                .await
                .map(|_| ())
                .map_err(|rejection| {
                    TransportError::Status(rejection.status().as_u16(), rejection.to_string())
                })
        }
        .boxed()
    }
}
