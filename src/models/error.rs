use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for a failed API call
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
}
