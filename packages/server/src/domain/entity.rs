//! Domain entities.

use serde::Serialize;

use super::{
    auth::AuthClaims,
    outbound::PusherChannel,
    value_object::{ConnectionId, Identity, RoomId, Timestamp},
};

/// One authenticated session.
///
/// Everything here is fixed at handshake time. Room membership is owned by
/// the [`RoomRegistry`](super::RoomRegistry), never by the connection itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub identity: Identity,
    pub display_name: Option<String>,
    pub numeric_user_id: Option<u64>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, identity: Identity, connected_at: Timestamp) -> Self {
        Self {
            id,
            identity,
            display_name: None,
            numeric_user_id: None,
            connected_at,
        }
    }

    /// Build the session for `identity`, enriched with the verified claims.
    pub fn from_claims(
        id: ConnectionId,
        identity: Identity,
        claims: &AuthClaims,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            id,
            identity,
            display_name: claims.display_name.clone().filter(|name| !name.is_empty()),
            numeric_user_id: claims.numeric_user_id,
            connected_at,
        }
    }
}

/// A room member: the session plus the handle used to deliver to it.
#[derive(Debug, Clone)]
pub struct Member {
    pub connection: Connection,
    pub channel: PusherChannel,
}

impl Member {
    pub fn new(connection: Connection, channel: PusherChannel) -> Self {
        Self {
            connection,
            channel,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.connection.id
    }
}

/// Point-in-time view of one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub member_count: usize,
    pub created_at: Timestamp,
}

/// Result of removing a connection from its room.
#[derive(Debug, Clone)]
pub struct Departure {
    pub connection: Connection,
    pub room_id: RoomId,
    /// Members still in the room after the removal.
    pub remaining: Vec<Member>,
    /// Whether the removal emptied (and therefore deleted) the room.
    pub room_removed: bool,
}
