use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use tracing::warn;

use crate::app::AppState;
use crate::auth::auth::AuthUser;
use crate::models::{ErrorResponse, PublishRequest, PublishResponse};
use crate::services::presence_service::publish_presence;

/// Announce the caller's presence state on a topic
pub async fn presence_publish(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(request): Json<PublishRequest>,
) -> Result<(StatusCode, Json<PublishResponse>), (StatusCode, Json<ErrorResponse>)> {
    match publish_presence(&state.bus, &caller, request).await {
        Ok(_) => Ok((StatusCode::OK, Json(PublishResponse { success: true }))),
        Err(rejection) => {
            warn!("Rejected presence publish from user {}: {}", caller.user.id, rejection);
            Err(ErrorResponse::reply(rejection.status(), rejection.to_string()))
        }
    }
}
