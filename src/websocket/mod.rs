pub mod client_id;
pub mod handler;
pub mod msg_position_handler;
pub mod msg_ping_handler;
