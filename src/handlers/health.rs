use std::sync::Arc;
use axum::{extract::State, Json};
use chrono::Utc;
use crate::AppState;
use crate::models::HealthResponse;
use tracing::debug;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
        server_time: Utc::now().to_rfc3339(),
    })
}

/// Readiness check endpoint
pub async fn ready_check(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Readiness check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: format!("Service is ready ({} live sessions)", app_state.registry.len()),
        server_time: Utc::now().to_rfc3339(),
    })
}
