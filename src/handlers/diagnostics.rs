use std::sync::{Arc, Mutex, OnceLock};
use axum::{extract::State, http::StatusCode, Json};
use sysinfo::System;
use tracing::info;

use crate::AppState;
use crate::models::DiagnosticsResponse;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Connection counts and host resource usage
pub async fn diagnostics(
    State(app_state): State<Arc<AppState>>,
) -> (StatusCode, Json<DiagnosticsResponse>) {

    let n_conn = app_state.registry.len() as u32;
    let n_positioned = app_state.registry.positioned_count() as u32;

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| {
            Mutex::new(System::new_all())
        });
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
            Err(_) => (0.0, 0, 0, 0)
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Conn: {}, Positioned: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        n_conn,
        n_positioned
    );

    (
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_conn,
            n_positioned,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    )
}
