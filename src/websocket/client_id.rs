use axum::http::{header, HeaderMap, HeaderValue};
use tracing::error;
use cookie::{Cookie, SameSite};
use serde::Deserialize;
use uuid::Uuid;

/// Query parameters accepted on the WebSocket endpoint
#[derive(Debug, Deserialize, Default)]
pub struct ConnectQuery {
    pub client_id: Option<String>,
}

const MAX_ID_LEN: usize = 64;

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Read the logical client id from the session cookie, if present and well formed.
pub fn id_from_cookies(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == cookie_name)
        .map(|c| c.value().to_string())
        .filter(|id| is_valid_id(id))
}

/// Resolve the logical id for a new connection: explicit query parameter first,
/// then the session cookie, otherwise a freshly minted id.
pub fn resolve_client_id(query: &ConnectQuery, headers: &HeaderMap, cookie_name: &str) -> String {
    query
        .client_id
        .clone()
        .filter(|id| is_valid_id(id))
        .or_else(|| id_from_cookies(headers, cookie_name))
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Cookie binding `id` to the browser context so reconnects reuse it.
pub fn session_cookie(cookie_name: &str, id: &str) -> Cookie<'static> {
    Cookie::build((cookie_name.to_string(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Response headers carrying the session cookie for `id`.
pub fn session_cookie_headers(cookie_name: &str, id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(&session_cookie(cookie_name, id).to_string()) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => error!("Failed to encode session cookie: {}", e),
    }
    headers
}
