use serde::{Deserialize, Serialize};
use crate::models::{PositionReport, UserPosition};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WelcomeMessage {
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CurrentUsersMessage {
    pub users: Vec<UserPosition>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserDisconnectedMessage {
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PongMessage {
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct PingMessage {}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ReceivedMessage {
    #[serde(rename = "position")]
    Position(PositionReport),
    #[serde(rename = "ping")]
    Ping(PingMessage),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum SendMessage {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMessage),
    #[serde(rename = "current_users")]
    CurrentUsers(CurrentUsersMessage),
    #[serde(rename = "user_position_update")]
    UserPositionUpdate(UserPosition),
    #[serde(rename = "user_disconnected")]
    UserDisconnected(UserDisconnectedMessage),
    #[serde(rename = "pong")]
    Pong(PongMessage),
}
