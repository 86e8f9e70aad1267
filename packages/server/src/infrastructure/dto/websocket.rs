//! WebSocket message DTOs.
//!
//! Every frame is a JSON object discriminated by its `type` field.

use serde::{Deserialize, Serialize};

use crate::domain::{BackpackItem, MarketItem};

/// Message type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    AuthSuccess,
    AuthFailed,
    Action,
    Chat,
    ListRooms,
    RoomList,
    PlayerJoined,
    PlayerLeft,
    PlayerList,
    GetBackpack,
    BackpackInfo,
    GetMarket,
    MarketInfo,
}

/// First frame of every connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeRequest {
    /// Informational only; any string is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    pub token: String,
    #[serde(rename = "openid", alias = "identity")]
    pub identity: String,
    pub room: String,
}

/// Minimal view of an application frame used to route it.
///
/// The frame itself is forwarded verbatim; only `type` and an optional
/// `token` are ever looked at. Both are kept as raw JSON so a payload of any
/// shape still routes.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type", default)]
    pub kind: Option<serde_json::Value>,
    #[serde(default)]
    pub token: Option<serde_json::Value>,
}

/// Routing decision for an application frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    Action,
    Chat,
    ListRooms,
    GetBackpack,
    GetMarket,
    Unknown(Option<String>),
}

impl InboundEnvelope {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// `token` when it is a JSON string.
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().and_then(serde_json::Value::as_str)
    }

    pub fn kind(&self) -> InboundKind {
        match self.kind.as_ref().and_then(serde_json::Value::as_str) {
            Some("action") => InboundKind::Action,
            Some("chat") => InboundKind::Chat,
            Some("list_rooms") => InboundKind::ListRooms,
            Some("get_backpack") => InboundKind::GetBackpack,
            Some("get_market") => InboundKind::GetMarket,
            other => InboundKind::Unknown(other.map(str::to_string)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSuccessMessage {
    pub r#type: MessageType,
}

impl Default for AuthSuccessMessage {
    fn default() -> Self {
        Self {
            r#type: MessageType::AuthSuccess,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFailedMessage {
    pub r#type: MessageType,
    pub reason: String,
}

impl AuthFailedMessage {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::AuthFailed,
            reason: reason.into(),
        }
    }
}

/// Chat frame as sent by the bundled client. The server never parses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub r#type: MessageType,
    pub player_id: String,
    pub text: String,
}

/// Action frame as sent by the bundled client. The server never parses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMessage {
    pub r#type: MessageType,
    pub player_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Request frame without payload (`list_rooms`, `get_backpack`, `get_market`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMessage {
    pub r#type: MessageType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerJoinedMessage {
    pub r#type: MessageType,
    pub player_id: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLeftMessage {
    pub r#type: MessageType,
    pub player_id: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: String,
    pub username: Option<String>,
    pub user_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerListMessage {
    pub r#type: MessageType,
    pub players: Vec<PlayerInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room: String,
    pub player_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListMessage {
    pub r#type: MessageType,
    pub rooms: Vec<RoomInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackpackInfoMessage {
    pub r#type: MessageType,
    pub items: Vec<BackpackItem>,
    pub count: usize,
    pub user_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfoMessage {
    pub r#type: MessageType,
    pub items: Vec<MarketItem>,
    pub count: usize,
}
