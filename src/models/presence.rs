use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A positioned participant, as carried in snapshots and incremental updates
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct UserPosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Position reported by a client. Either coordinate may be missing, in which
/// case the report is ignored.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Default)]
pub struct PositionReport {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl PositionReport {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }
}

/// Response for the presence snapshot endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct PresenceResponse {
    pub users: Vec<UserPosition>,
}
