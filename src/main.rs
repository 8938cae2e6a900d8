use std::panic;
use topic_presence::app::{build_app, AppState};
use topic_presence::config::{self, Config};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Configuration first so log_level can shape the filter
    let loaded = Config::load();
    let fallback_filter = match &loaded {
        Ok(config) => config.log_filter(),
        Err(_) => Config::default().log_filter(),
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter.into()))
        .init();

    info!("Starting presence relay...");

    let config = config::init_config(match loaded {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            warn!("Using default configuration");
            Config::default()
        }
    });

    if config.auth_jwt_secret.is_none() {
        warn!("No AUTH_JWT_SECRET configured - every authenticated route will answer 500");
    }
    if config.is_development() {
        info!(
            "Presence timings: staleness {:?}, tick {:?}, throttle {:?}, max users {}",
            config.staleness_window(),
            config.tick_interval(),
            config.throttle_window(),
            config.presence_max_users_shown
        );
    }

    let app = build_app(AppState::from_config(config));

    let listener = match tokio::net::TcpListener::bind(config.server_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", config.server_address(), e);
            std::process::exit(1);
        }
    };

    info!("Presence relay running on http://{}", config.server_address());
    info!("Swagger UI available at http://{}/swagger", config.server_address());

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
