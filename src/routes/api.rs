use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::app::AppState;
use crate::handlers::{diagnostics, health_check, presence_publish, presence_subscribe};
use crate::routes::auth_middleware::auth_middleware;

/// Create API routes
pub fn create_api_routes(state: AppState) -> Router {
    Router::<AppState>::new()
        .route("/presence/publish", post(presence_publish))
        .route("/presence/subscribe/:topic_id", get(presence_subscribe))
        .route("/diagnostics", get(diagnostics))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)) // Applies to all routes added above
        .route("/health", get(health_check))
        .with_state(state)
}
