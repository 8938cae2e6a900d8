use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use std::sync::{Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

use crate::app::AppState;
use crate::auth::auth::{self, AuthUser};
use crate::models::{DiagnosticsResponse, ErrorResponse};

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Bus and process statistics
pub async fn diagnostics(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> Result<(StatusCode, Json<DiagnosticsResponse>), (StatusCode, Json<ErrorResponse>)> {
    auth::ensure_staff(&caller)?;

    let stats = state.bus.stats().await;

    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0),
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB, Channels: {}, Subscribers: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        stats.channels,
        stats.subscribers
    );

    Ok((
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_channels: stats.channels as u32,
            n_subscribers: stats.subscribers as u32,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    ))
}
