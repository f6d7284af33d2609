use tracing::{debug, error};
use uuid::Uuid;
use chrono::Utc;

use crate::models::{PongMessage, SendMessage};
use crate::ws::{dispatcher, registry::SessionRegistry};

/// Handle PingMessage
pub fn handle_ping_message(conn_id: Uuid, registry: &SessionRegistry) {
    // Handle ping message - send a pong message back.
    debug!("Ping message received on connection {}", conn_id);

    let Some(handle) = registry.handle_for_conn(conn_id) else {
        debug!("Connection {} no longer registered, dropping pong", conn_id);
        return;
    };

    // Reply with pong
    let pong = SendMessage::Pong(PongMessage { date: Utc::now().to_rfc3339() });
    if let Err(e) = dispatcher::send_to(&handle, &pong) {
        error!("Failed to send Pong message on connection {}: {:?}", conn_id, e);
    }
}
