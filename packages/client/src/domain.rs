//! Domain logic for client-side operations.
//!
//! Pure functions and types with no I/O: reconnection policy, prompt command
//! parsing and classification of frames received from the relay.

use serde::Deserialize;

use jigger_server::{
    domain::{BackpackItem, MarketItem},
    infrastructure::dto::websocket::{PlayerInfo, RoomInfo},
};

use crate::error::ClientError;

/// Check if the client should exit immediately based on the error type.
///
/// `AuthFailed` is final: the relay never accepts the same credentials later.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::AuthFailed(_))
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Chat(String),
    Action(Option<String>),
    ListRooms,
    Backpack,
    Market,
    /// Unrecognised slash command, reported locally and never sent.
    Unknown(String),
}

impl UserCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let Some(command) = line.strip_prefix('/') else {
            return Some(UserCommand::Chat(line.to_string()));
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        let parsed = match name {
            "rooms" => UserCommand::ListRooms,
            "backpack" => UserCommand::Backpack,
            "market" => UserCommand::Market,
            "action" => UserCommand::Action((!rest.is_empty()).then(|| rest.to_string())),
            _ => UserCommand::Unknown(name.to_string()),
        };
        Some(parsed)
    }
}

/// A frame received from the relay, classified by its `type`.
///
/// `chat` and `action` frames are relayed verbatim from other clients, so
/// their fields are all optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    AuthSuccess,
    AuthFailed {
        reason: String,
    },
    PlayerList {
        players: Vec<PlayerInfo>,
    },
    PlayerJoined {
        player_id: String,
        #[serde(default)]
        username: Option<String>,
    },
    PlayerLeft {
        player_id: String,
        #[serde(default)]
        username: Option<String>,
    },
    Chat {
        #[serde(default)]
        player_id: Option<String>,
        #[serde(default)]
        text: Option<String>,
    },
    Action {
        #[serde(default)]
        player_id: Option<String>,
        #[serde(default)]
        action: Option<String>,
    },
    RoomList {
        rooms: Vec<RoomInfo>,
    },
    BackpackInfo {
        items: Vec<BackpackItem>,
        #[serde(default)]
        user_id: Option<u64>,
    },
    MarketInfo {
        items: Vec<MarketItem>,
    },
}

impl ServerEvent {
    /// `None` for frames this client does not understand.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}
