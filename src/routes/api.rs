use crate::{handlers::{health_check, ready_check, diagnostics, get_presence, post_position, list_items, get_item}, AppState};
use axum::{routing::{get, post}, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes() -> Router<Arc<AppState>> {
    Router::<Arc<AppState>>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/presence", get(get_presence))
        .route("/v1/presence/position", post(post_position))
        .route("/v1/items", get(list_items))
        .route("/v1/items/:code", get(get_item))
}
