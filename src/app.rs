use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::bus::MessageBus;
use crate::config::Config;
use crate::docs::ApiDoc;
use crate::routes::create_api_routes;

/// Shared state of the relay server
#[derive(Clone)]
pub struct AppState {
    pub bus: Arc<MessageBus>,
    pub jwt_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(bus: Arc<MessageBus>, jwt_secret: Option<String>) -> Self {
        Self {
            bus,
            jwt_secret: jwt_secret.map(Arc::from),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let bus = MessageBus::new(config.max_backlog_age(), config.bus_max_backlog_size);
        Self::new(Arc::new(bus), config.auth_jwt_secret.clone())
    }
}

/// Full relay router: API, Swagger UI and request tracing
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", create_api_routes(state))
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
