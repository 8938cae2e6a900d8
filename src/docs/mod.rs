use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Relay is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Announce the caller's presence on a topic
#[utoipa::path(
    post,
    path = "/api/presence/publish",
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Presence broadcast", body = PublishResponse),
        (status = 400, description = "Editing without a post", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Whisper from a non-staff user", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn presence_publish_doc() {}

/// Relay statistics (staff only)
#[utoipa::path(
    get,
    path = "/api/diagnostics",
    responses(
        (status = 200, description = "Relay statistics", body = DiagnosticsResponse),
        (status = 403, description = "Caller is not staff", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        presence_publish_doc,
        diagnostics_doc,
    ),
    components(
        schemas(HealthResponse, PublishRequest, PublishResponse, ActivityState, DiagnosticsResponse, ErrorResponse)
    ),
    tags(
        (name = "presence", description = "Topic presence relay")
    )
)]
pub struct ApiDoc;
