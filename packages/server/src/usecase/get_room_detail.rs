//! UseCase: ルーム詳細取得

use std::sync::Arc;

use crate::domain::{Member, RoomId, RoomRegistry};

use super::error::GetRoomDetailError;

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// ルームのメンバーを参加順で返す
    ///
    /// ルームは空になった時点で消えるため、メンバーがいなければ存在しない。
    pub async fn execute(&self, room_id: &RoomId) -> Result<Vec<Member>, GetRoomDetailError> {
        let members = self.registry.snapshot_members(room_id).await;
        if members.is_empty() {
            return Err(GetRoomDetailError::RoomNotFound);
        }
        Ok(members)
    }
}
