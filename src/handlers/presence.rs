use std::sync::Arc;
use axum::{extract::State, http::{HeaderMap, StatusCode}, Json};
use tracing::debug;
use uuid::Uuid;

use crate::AppState;
use crate::models::{PositionReport, PresenceResponse};
use crate::websocket::client_id::{id_from_cookies, session_cookie_headers};
use crate::ws::lifecycle;

/// Current positioned users, for clients polling instead of listening on the socket
pub async fn get_presence(State(app_state): State<Arc<AppState>>) -> Json<PresenceResponse> {
    Json(PresenceResponse {
        users: lifecycle::current_users(&app_state.registry),
    })
}

/// Position report over plain HTTP, attributed through the session cookie.
/// A browser without a session gets a fresh id in the cookie; incomplete
/// reports are accepted and ignored.
pub async fn post_position(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(report): Json<PositionReport>,
) -> (StatusCode, HeaderMap) {
    let cookie_name = &app_state.config.session_cookie_name;
    let id = id_from_cookies(&headers, cookie_name).unwrap_or_else(|| Uuid::new_v4().to_string());

    if report.coordinates().is_some() {
        lifecycle::attach_polling(&app_state.registry, &id);
    }
    if !lifecycle::apply_position(&app_state.registry, &id, &report) {
        debug!("Position report from {} ignored", id);
    }
    (StatusCode::NO_CONTENT, session_cookie_headers(cookie_name, &id))
}
