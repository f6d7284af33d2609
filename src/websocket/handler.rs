use std::sync::Arc;
use axum::{
    extract::{Query, State, ws::{Message, WebSocket, WebSocketUpgrade}},
    http::HeaderMap,
    response::Response,
};
use tracing::{info, warn, debug};
use futures_util::{StreamExt, SinkExt};

use crate::AppState;
use crate::models::ReceivedMessage;
use crate::websocket::client_id::{resolve_client_id, session_cookie_headers, ConnectQuery};
use crate::websocket::msg_position_handler::handle_position_message;
use crate::websocket::msg_ping_handler::handle_ping_message;
use crate::ws::{connctx::ConnHandle, lifecycle};


/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    let cookie_name = app_state.config.session_cookie_name.clone();
    let client_id = resolve_client_id(&query, &headers, &cookie_name);
    info!("New WebSocket connection attempt from {}", client_id);

    let cookie_headers = session_cookie_headers(&cookie_name, &client_id);
    let mut response = ws.on_upgrade(move |socket| handle_socket(socket, client_id, app_state));
    response.headers_mut().extend(cookie_headers);
    response
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, client_id: String, app_state: Arc<AppState>) {

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // The registry owns the only producer of this queue
    let (handle, mut outbound) = ConnHandle::new(app_state.config.outbound_buffer);
    let conn_id = handle.conn_id;
    info!("WebSocket connection established for {} with connection_id: {}", client_id, conn_id);
    lifecycle::on_connect(&app_state.registry, &client_id, handle);

    // Drain the outbound queue into the socket, one bounded write at a time
    let send_timeout = app_state.config.send_timeout();
    let mut send_task = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            match tokio::time::timeout(send_timeout, sender.send(Message::Text(text))).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Write to connection {} failed: {}", conn_id, e);
                    break;
                }
                Err(_) => {
                    warn!("Write to connection {} timed out", conn_id);
                    break;
                }
            }
        }
        let _ = sender.close().await;
    });

    // Listen to the websocket for incoming messages
    let registry = app_state.registry.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!("Read from connection {} failed: {}", conn_id, e);
                    break;
                }
            };

            // Parse the incoming message as JSON
            let json_msg: ReceivedMessage = match serde_json::from_str(&text) {
                Ok(json_msg) => json_msg,
                Err(e) => {
                    warn!("Failed to parse message on connection {}: {}", conn_id, e);
                    continue;
                }
            };

            // Handle different message types
            match json_msg {
                ReceivedMessage::Position(position_msg) => {
                    handle_position_message(&position_msg, conn_id, &registry);
                }
                ReceivedMessage::Ping(_) => {
                    handle_ping_message(conn_id, &registry);
                }
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    lifecycle::on_disconnect(&app_state.registry, conn_id);
    info!("WebSocket connection {} terminated", conn_id);
}
