//! Room registry trait.
//!
//! The registry is the only owner of room membership. Every operation is
//! atomic with respect to every other one, and callers only ever see
//! snapshots, never the underlying sets.

use async_trait::async_trait;

use super::{
    entity::{Connection, Departure, Member, RoomSummary},
    error::RegistryError,
    outbound::PusherChannel,
    value_object::{ConnectionId, Identity, RoomId},
};

#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Add `connection` to `room_id`, creating the room when absent.
    ///
    /// Returns the room's members right after the insertion, in join order,
    /// the new member included.
    async fn join(
        &self,
        connection: Connection,
        channel: PusherChannel,
        room_id: RoomId,
    ) -> Result<Vec<Member>, RegistryError>;

    /// Remove the connection from its room, deleting the room once empty.
    ///
    /// `None` when the connection is not in any room.
    async fn leave(&self, connection_id: &ConnectionId) -> Option<Departure>;

    /// The room the connection currently belongs to.
    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// Members of `room_id` in join order; empty for an unknown room.
    async fn snapshot_members(&self, room_id: &RoomId) -> Vec<Member>;

    /// All rooms with their member counts, ordered by room id.
    async fn snapshot_rooms(&self) -> Vec<RoomSummary>;

    /// Every member bound to `identity`, across all rooms.
    async fn sessions_of(&self, identity: &Identity) -> Vec<Member>;
}
