use tracing::debug;
use uuid::Uuid;

use crate::models::PositionReport;
use crate::ws::{lifecycle, registry::SessionRegistry};

/// Handle a position report received on `conn_id`
pub fn handle_position_message(position_msg: &PositionReport, conn_id: Uuid, registry: &SessionRegistry) {
    debug!("Position report on connection {}: {:?}", conn_id, position_msg);
    lifecycle::on_position(registry, conn_id, position_msg);
}
