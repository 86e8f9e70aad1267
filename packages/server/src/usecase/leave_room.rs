//! UseCase: 退室処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() と player_left の通知
//! - 最後のメンバーが抜けたときにルームが消えること
//! - 既に外されている接続の退室が何もしないこと（dead member の後始末との競合）

use std::sync::Arc;

use crate::domain::{ConnectionId, Departure, RoomRegistry};

use super::broadcast::{BroadcastReport, BroadcastUseCase};

/// 退室のユースケース
pub struct LeaveRoomUseCase {
    /// RoomRegistry（メンバー管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    broadcast: Arc<BroadcastUseCase>,
}

impl LeaveRoomUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>, broadcast: Arc<BroadcastUseCase>) -> Self {
        Self {
            registry,
            broadcast,
        }
    }

    /// 退室を実行
    ///
    /// # Returns
    ///
    /// * `Some(Departure)` - 退室した（通知はまだ送っていない）
    /// * `None` - どのルームにも所属していなかった
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<Departure> {
        let departure = self.registry.leave(connection_id).await?;
        tracing::info!(
            "'{}' left room '{}' ({} remaining)",
            departure.connection.identity,
            departure.room_id,
            departure.remaining.len()
        );
        Some(departure)
    }

    /// player_left を残りのメンバーにブロードキャスト
    ///
    /// ルームが消えていれば通知先はいないので何もしない。
    pub async fn broadcast_player_left(
        &self,
        departure: &Departure,
        message: &str,
    ) -> BroadcastReport {
        if departure.room_removed {
            return BroadcastReport::default();
        }
        self.broadcast
            .execute(&departure.room_id, Some(&departure.connection.id), message)
            .await
    }
}
