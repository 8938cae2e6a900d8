use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

/// Public profile fields of a user shown in presence lists
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct PresenceUser {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_template: Option<String>,
}

impl PresenceUser {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            name: None,
            avatar_template: None,
        }
    }
}

/// What a user is doing on a topic
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityState {
    Replying,
    Editing,
    Closed,
}

/// Message carried on a presence channel
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PresenceMessage {
    pub user: PresenceUser,
    pub state: ActivityState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<u64>,
    #[serde(
        default,
        deserialize_with = "deserialize_flag",
        serialize_with = "serialize_flag"
    )]
    pub is_whisper: bool,
}

/// Body of `POST /api/presence/publish`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct PublishRequest {
    pub state: ActivityState,
    pub topic_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<u64>,
    #[serde(
        default,
        deserialize_with = "deserialize_flag",
        serialize_with = "serialize_flag"
    )]
    #[schema(value_type = Option<u8>)]
    pub is_whisper: bool,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct PublishResponse {
    pub success: bool,
}

/// Frame sent to WebSocket subscribers
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BusEnvelope {
    pub id: i64,
    pub channel: String,
    pub data: serde_json::Value,
    /// Milliseconds between publish and send; replayed backlog is older than zero
    #[serde(default)]
    pub age_ms: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

// Whisper flags arrive as 0/1 from browsers and as booleans from everything else.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        None => false,
    })
}

fn serialize_flag<S>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*flag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_whisper_flag_from_int_or_bool() {
        let a: PublishRequest =
            serde_json::from_value(json!({"state": "replying", "topic_id": 1, "is_whisper": 1})).unwrap();
        let b: PublishRequest =
            serde_json::from_value(json!({"state": "replying", "topic_id": 1, "is_whisper": false})).unwrap();
        let c: PublishRequest = serde_json::from_value(json!({"state": "closed", "topic_id": 1})).unwrap();
        assert!(a.is_whisper);
        assert!(!b.is_whisper);
        assert!(!c.is_whisper);
    }

    #[test]
    fn rejects_unknown_state() {
        let res = serde_json::from_value::<PresenceMessage>(json!({"user": {"id": 1}, "state": "typing"}));
        assert!(res.is_err());
    }

    #[test]
    fn rejects_message_without_user_id() {
        let res = serde_json::from_value::<PresenceMessage>(
            json!({"user": {"username": "sam"}, "state": "replying"}),
        );
        assert!(res.is_err());
    }

    #[test]
    fn serializes_whisper_as_number() {
        let msg = PresenceMessage {
            user: PresenceUser::new(3, "sam"),
            state: ActivityState::Editing,
            post_id: Some(99),
            is_whisper: true,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["is_whisper"], json!(1));
        assert_eq!(value["state"], json!("editing"));
        assert_eq!(value["post_id"], json!(99));
    }
}
