//! UseCase: ルーム一覧取得
//!
//! WebSocket の `list_rooms` と HTTP の `GET /api/rooms` の両方から使われる。

use std::sync::Arc;

use crate::domain::{RoomRegistry, RoomSummary};

/// ルーム一覧取得のユースケース
pub struct ListRoomsUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl ListRoomsUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// 現在のルームを room id 順で返す（空のルームは存在しない）
    pub async fn execute(&self) -> Vec<RoomSummary> {
        self.registry.snapshot_rooms().await
    }
}
