//! Conversion logic between DTOs and domain entities.

use jigger_shared::time::timestamp_to_cst_rfc3339;

use crate::domain::{AuthClaims, Connection, Member, RoomSummary};
use crate::infrastructure::dto::{auth, http, websocket as dto};

// ========================================
// DTO → Domain Entity
// ========================================

impl From<auth::VerifyResponse> for AuthClaims {
    fn from(dto: auth::VerifyResponse) -> Self {
        Self {
            subject: dto.openid,
            numeric_user_id: dto.user_id,
            display_name: dto.username,
            application: dto.app_id,
            session_id: dto.session_id,
            expiry: dto.exp,
            issued_at: dto.iat,
            token_id: dto.jti,
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Connection> for dto::PlayerInfo {
    fn from(model: &Connection) -> Self {
        Self {
            player_id: model.identity.as_str().to_string(),
            username: model.display_name.clone(),
            user_id: model.numeric_user_id,
        }
    }
}

impl From<&Member> for dto::PlayerInfo {
    fn from(model: &Member) -> Self {
        (&model.connection).into()
    }
}

impl From<&Connection> for dto::PlayerJoinedMessage {
    fn from(model: &Connection) -> Self {
        Self {
            r#type: dto::MessageType::PlayerJoined,
            player_id: model.identity.as_str().to_string(),
            username: model.display_name.clone(),
        }
    }
}

impl From<&Connection> for dto::PlayerLeftMessage {
    fn from(model: &Connection) -> Self {
        Self {
            r#type: dto::MessageType::PlayerLeft,
            player_id: model.identity.as_str().to_string(),
            username: model.display_name.clone(),
        }
    }
}

impl From<&[Member]> for dto::PlayerListMessage {
    fn from(members: &[Member]) -> Self {
        Self {
            r#type: dto::MessageType::PlayerList,
            players: members.iter().map(dto::PlayerInfo::from).collect(),
        }
    }
}

impl From<&RoomSummary> for dto::RoomInfo {
    fn from(model: &RoomSummary) -> Self {
        Self {
            room: model.room_id.as_str().to_string(),
            player_count: model.member_count,
        }
    }
}

impl From<&[RoomSummary]> for dto::RoomListMessage {
    fn from(rooms: &[RoomSummary]) -> Self {
        Self {
            r#type: dto::MessageType::RoomList,
            rooms: rooms.iter().map(dto::RoomInfo::from).collect(),
        }
    }
}

impl From<&RoomSummary> for http::RoomSummaryDto {
    fn from(model: &RoomSummary) -> Self {
        Self {
            room: model.room_id.as_str().to_string(),
            player_count: model.member_count,
            created_at: timestamp_to_cst_rfc3339(model.created_at.value()),
        }
    }
}

impl From<&Member> for http::PlayerDetailDto {
    fn from(model: &Member) -> Self {
        Self {
            player_id: model.connection.identity.as_str().to_string(),
            username: model.connection.display_name.clone(),
            user_id: model.connection.numeric_user_id,
            connected_at: timestamp_to_cst_rfc3339(model.connection.connected_at.value()),
        }
    }
}
