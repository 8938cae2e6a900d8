use axum::{http::StatusCode, Json};
use serde_json::Value;

use crate::models::{ErrorResponse, PresenceUser};

const STAFF_ROLES: [&str; 2] = ["staff", "admin"];

/// Caller resolved from a verified token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user: PresenceUser,
    pub is_staff: bool,
}

impl AuthUser {
    pub fn new(user: PresenceUser, is_staff: bool) -> Self {
        Self { user, is_staff }
    }

    /// Build the caller from JWT claims: numeric `sub`, `username`, optional
    /// `name`/`avatar_template` and a `roles` array.
    pub fn from_claims(claims: &Value) -> Result<Self, String> {
        let id = match claims.get("sub") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
        .ok_or_else(|| "JWT token does not contain a numeric 'sub' claim".to_string())?;

        let text = |key: &str| claims.get(key).and_then(|v| v.as_str()).map(|s| s.to_string());

        let is_staff = claims
            .get("roles")
            .and_then(|v| v.as_array())
            .map(|roles| {
                roles
                    .iter()
                    .filter_map(|r| r.as_str())
                    .any(|r| STAFF_ROLES.contains(&r))
            })
            .unwrap_or(false);

        Ok(Self {
            user: PresenceUser {
                id,
                username: text("username").unwrap_or_default(),
                name: text("name"),
                avatar_template: text("avatar_template"),
            },
            is_staff,
        })
    }
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if user.is_staff {
        return Ok(());
    }
    Err(ErrorResponse::reply(StatusCode::FORBIDDEN, "Staff access required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_user_and_roles_from_claims() {
        let claims = json!({"sub": "12", "username": "alice", "avatar_template": "/a/{size}.png", "roles": ["staff"]});
        let auth = AuthUser::from_claims(&claims).unwrap();
        assert_eq!(auth.user.id, 12);
        assert_eq!(auth.user.username, "alice");
        assert_eq!(auth.user.avatar_template.as_deref(), Some("/a/{size}.png"));
        assert!(auth.is_staff);
        assert!(ensure_staff(&auth).is_ok());
    }

    #[test]
    fn regular_users_are_not_staff() {
        let auth = AuthUser::from_claims(&json!({"sub": 4, "roles": ["member"]})).unwrap();
        assert!(!auth.is_staff);
        let moderator = AuthUser::from_claims(&json!({"sub": 5, "roles": ["moderator"]})).unwrap();
        assert!(!moderator.is_staff);
        let admin = AuthUser::from_claims(&json!({"sub": 6, "roles": ["admin"]})).unwrap();
        assert!(admin.is_staff);
        let (status, _) = ensure_staff(&auth).unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn non_numeric_subject_is_rejected() {
        assert!(AuthUser::from_claims(&json!({"sub": "abc"})).is_err());
        assert!(AuthUser::from_claims(&json!({})).is_err());
    }
}
