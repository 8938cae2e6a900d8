use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, Path, Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::auth::AuthUser;
use crate::presence::channel_for_topic;

#[derive(Debug, Deserialize)]
pub struct SubscribeQuery {
    pub last_id: Option<i64>,
}

/// WebSocket stream of a topic's presence channel
pub async fn presence_subscribe(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(topic_id): Path<u64>,
    Query(query): Query<SubscribeQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    info!("Presence subscription requested by user {} for topic {}", caller.user.id, topic_id);
    ws.on_upgrade(move |socket| handle_socket(socket, state, caller, topic_id, query.last_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, caller: AuthUser, topic_id: u64, last_id: Option<i64>) {
    let connection_id = Uuid::new_v4();
    let channel = channel_for_topic(topic_id);
    info!("Presence socket {} open on {} for user {}", connection_id, channel, caller.user.id);

    let (mut sender, mut receiver) = socket.split();
    let mut subscription = state.bus.subscribe(&channel, last_id).await;

    // Forward bus messages the caller may see
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = subscription.next().await {
            if !message.visible_to(caller.is_staff) {
                continue;
            }
            let frame = match serde_json::to_string(&message.envelope(Instant::now())) {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Failed to encode presence frame {}: {}", message.id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    // Clients never send anything meaningful; drain until they go away
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };
    info!("Presence socket {} closed", connection_id);
}
