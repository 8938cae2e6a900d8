use axum::http::StatusCode;
use tracing::info;

use crate::auth::auth::AuthUser;
use crate::bus::{Audience, MessageBus};
use crate::models::{ActivityState, PresenceMessage, PublishRequest};
use crate::presence::channel_for_topic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishRejection {
    MissingPostId,
    WhisperNotAllowed,
}

impl PublishRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            PublishRejection::MissingPostId => StatusCode::BAD_REQUEST,
            PublishRejection::WhisperNotAllowed => StatusCode::FORBIDDEN,
        }
    }
}

impl std::fmt::Display for PublishRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishRejection::MissingPostId => write!(f, "'editing' requires a post_id"),
            PublishRejection::WhisperNotAllowed => write!(f, "Only staff can whisper"),
        }
    }
}

/// Broadcast a user's presence change on the topic channel.
/// Whispers are only delivered to staff subscribers.
pub async fn publish_presence(
    bus: &MessageBus,
    caller: &AuthUser,
    request: PublishRequest,
) -> Result<i64, PublishRejection> {
    if request.state == ActivityState::Editing && request.post_id.is_none() {
        return Err(PublishRejection::MissingPostId);
    }
    if request.is_whisper && !caller.is_staff {
        return Err(PublishRejection::WhisperNotAllowed);
    }

    let message = PresenceMessage {
        user: caller.user.clone(),
        state: request.state,
        post_id: request.post_id,
        is_whisper: request.is_whisper,
    };
    let audience = if request.is_whisper { Audience::Staff } else { Audience::All };
    let payload = serde_json::to_value(&message).unwrap_or_default();

    let channel = channel_for_topic(request.topic_id);
    let id = bus.publish(&channel, payload, audience).await;
    info!("User {} is {:?} on topic {}", caller.user.id, request.state, request.topic_id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PresenceUser;
    use std::time::Duration;

    fn bus() -> MessageBus {
        MessageBus::new(Duration::from_secs(10), 10)
    }

    fn request(state: ActivityState, post_id: Option<u64>, is_whisper: bool) -> PublishRequest {
        PublishRequest { state, topic_id: 42, post_id, is_whisper }
    }

    #[tokio::test]
    async fn publishes_caller_as_message_user() {
        let bus = bus();
        let mut sub = bus.subscribe("/presence/42", None).await;
        let caller = AuthUser::new(PresenceUser::new(7, "seven"), false);
        publish_presence(&bus, &caller, request(ActivityState::Replying, None, false))
            .await
            .unwrap();

        let msg = sub.next().await.unwrap();
        let parsed: PresenceMessage = serde_json::from_value(msg.payload).unwrap();
        assert_eq!(parsed.user.id, 7);
        assert_eq!(parsed.state, ActivityState::Replying);
        assert_eq!(msg.audience, Audience::All);
    }

    #[tokio::test]
    async fn editing_without_post_is_rejected() {
        let caller = AuthUser::new(PresenceUser::new(7, "seven"), false);
        let res = publish_presence(&bus(), &caller, request(ActivityState::Editing, None, false)).await;
        assert_eq!(res, Err(PublishRejection::MissingPostId));
    }

    #[tokio::test]
    async fn whispers_need_staff_and_target_staff() {
        let bus = bus();
        let member = AuthUser::new(PresenceUser::new(7, "seven"), false);
        let res = publish_presence(&bus, &member, request(ActivityState::Replying, None, true)).await;
        assert_eq!(res, Err(PublishRejection::WhisperNotAllowed));

        let staff = AuthUser::new(PresenceUser::new(1, "mod"), true);
        publish_presence(&bus, &staff, request(ActivityState::Replying, None, true))
            .await
            .unwrap();
        let mut sub = bus.subscribe("/presence/42", None).await;
        assert_eq!(sub.next().await.unwrap().audience, Audience::Staff);
    }
}
