//! UseCase: ルーム内ブロードキャスト
//!
//! ## 概要
//!
//! ルームのメンバーのスナップショットを取り、送信者以外の全員の送信キューに
//! メッセージを積む。送信キューへの投入は待たないため、詰まった受信者が
//! 他のメンバーへの配信を止めることはない。
//!
//! ## 配信失敗
//!
//! 投入に失敗したメンバーは dead member とみなし、送信チャンネルを閉じて
//! ルームから外す。この経路では player_left を再ブロードキャストしない
//! （障害の連鎖でファンアウトが膨らまないようにするため）。

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomId, RoomRegistry};

/// ブロードキャスト結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// 送信キューへの投入に成功したメンバー
    pub delivered: Vec<ConnectionId>,
    /// 配信に失敗しルームから外されたメンバー
    pub evicted: Vec<ConnectionId>,
}

/// ブロードキャストのユースケース
pub struct BroadcastUseCase {
    /// RoomRegistry（メンバー管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
}

impl BroadcastUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// ブロードキャストを実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - 配信先のルーム
    /// * `sender` - 配信対象から除外する送信者（サーバー発のイベントなら `None`）
    /// * `payload` - 送信する JSON（そのまま転送される）
    pub async fn execute(
        &self,
        room_id: &RoomId,
        sender: Option<&ConnectionId>,
        payload: &str,
    ) -> BroadcastReport {
        let members = self.registry.snapshot_members(room_id).await;
        let mut report = BroadcastReport::default();

        for member in members.iter().filter(|m| Some(&m.id()) != sender) {
            match member.channel.push(payload) {
                Ok(()) => report.delivered.push(member.id()),
                Err(e) => {
                    tracing::warn!(
                        "Failed to deliver to '{}' in room '{}': {}; dropping member",
                        member.connection.identity,
                        room_id,
                        e
                    );
                    member.channel.close();
                    report.evicted.push(member.id());
                }
            }
        }

        // Cleanup happens after the fan-out so a dead member never delays it.
        for connection_id in &report.evicted {
            self.registry.leave(connection_id).await;
        }

        tracing::debug!(
            "Broadcast in room '{}': delivered={}, evicted={}",
            room_id,
            report.delivered.len(),
            report.evicted.len()
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Connection, Identity, PusherReceiver, Timestamp, outbound},
        infrastructure::registry::InMemoryRoomRegistry,
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 送信者以外の同じルームのメンバーにだけ届くこと
    // - 配信に失敗したメンバーがルームから外され、他のメンバーには届くこと
    // - 同じ送信者からのメッセージが送信順に届くこと
    // ========================================

    async fn join(
        registry: &Arc<InMemoryRoomRegistry>,
        identity: &str,
        room: &str,
        capacity: usize,
    ) -> (ConnectionId, PusherReceiver) {
        let connection = Connection::new(
            ConnectionId::generate(),
            Identity::new(identity.to_string()).unwrap(),
            Timestamp::new(0),
        );
        let id = connection.id;
        let (tx, rx) = outbound::channel(capacity);
        registry
            .join(connection, tx, RoomId::new(room.to_string()).unwrap())
            .await
            .unwrap();
        (id, rx)
    }

    fn lobby() -> RoomId {
        RoomId::new("lobby".to_string()).unwrap()
    }

    async fn try_recv(rx: &mut PusherReceiver) -> Option<String> {
        tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender_and_other_rooms() {
        // テスト項目: 送信者自身と他ルームのメンバーには届かない
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let usecase = BroadcastUseCase::new(registry.clone());
        let (alice, mut alice_rx) = join(&registry, "alice", "lobby", 8).await;
        let (bob, mut bob_rx) = join(&registry, "bob", "lobby", 8).await;
        let (_carol, mut carol_rx) = join(&registry, "carol", "arena", 8).await;

        // when (操作):
        let report = usecase
            .execute(&lobby(), Some(&alice), r#"{"type":"chat","text":"hi"}"#)
            .await;

        // then (期待する結果):
        assert_eq!(report.delivered, vec![bob]);
        assert!(report.evicted.is_empty());
        assert_eq!(
            try_recv(&mut bob_rx).await.as_deref(),
            Some(r#"{"type":"chat","text":"hi"}"#)
        );
        assert_eq!(try_recv(&mut alice_rx).await, None);
        assert_eq!(try_recv(&mut carol_rx).await, None);
    }

    #[tokio::test]
    async fn test_broadcast_without_sender_reaches_everyone() {
        // テスト項目: 送信者なし（サーバー発）の場合はルーム全員に届く
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let usecase = BroadcastUseCase::new(registry.clone());
        let (_alice, mut alice_rx) = join(&registry, "alice", "lobby", 8).await;
        let (_bob, mut bob_rx) = join(&registry, "bob", "lobby", 8).await;

        // when (操作):
        let report = usecase.execute(&lobby(), None, "event").await;

        // then (期待する結果):
        assert_eq!(report.delivered.len(), 2);
        assert_eq!(try_recv(&mut alice_rx).await.as_deref(), Some("event"));
        assert_eq!(try_recv(&mut bob_rx).await.as_deref(), Some("event"));
    }

    #[tokio::test]
    async fn test_broadcast_evicts_dead_member_and_completes() {
        // テスト項目: 送信に失敗したメンバーはルームから外され、残りには配信される
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let usecase = BroadcastUseCase::new(registry.clone());
        let (alice, _alice_rx) = join(&registry, "alice", "lobby", 8).await;
        let (dead, dead_rx) = join(&registry, "dead", "lobby", 8).await;
        let (carol, mut carol_rx) = join(&registry, "carol", "lobby", 8).await;
        drop(dead_rx);

        // when (操作):
        let report = usecase.execute(&lobby(), Some(&alice), "payload").await;

        // then (期待する結果):
        assert_eq!(report.delivered, vec![carol]);
        assert_eq!(report.evicted, vec![dead]);
        assert_eq!(try_recv(&mut carol_rx).await.as_deref(), Some("payload"));
        let remaining: Vec<ConnectionId> = registry
            .snapshot_members(&lobby())
            .await
            .iter()
            .map(|m| m.id())
            .collect();
        assert_eq!(remaining, vec![alice, carol]);
        assert_eq!(registry.room_of(&dead).await, None);
        assert_eq!(registry.snapshot_rooms().await[0].member_count, 2);
    }

    #[tokio::test]
    async fn test_broadcast_evicts_stalled_member_and_closes_its_channel() {
        // テスト項目: 送信キューが詰まったメンバーは待たずに外され、チャンネルが閉じられる
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let usecase = BroadcastUseCase::new(registry.clone());
        let (alice, _alice_rx) = join(&registry, "alice", "lobby", 8).await;
        let (slow, mut slow_rx) = join(&registry, "slow", "lobby", 1).await;
        usecase.execute(&lobby(), Some(&alice), "first").await;

        // when (操作):
        let report = usecase.execute(&lobby(), Some(&alice), "second").await;

        // then (期待する結果):
        assert_eq!(report.evicted, vec![slow]);
        assert_eq!(slow_rx.recv().await, None);
        assert_eq!(registry.room_of(&slow).await, None);
    }

    #[tokio::test]
    async fn test_broadcast_keeps_per_sender_order() {
        // テスト項目: 同じ送信者のメッセージは送信順に届く
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let usecase = BroadcastUseCase::new(registry.clone());
        let (alice, _alice_rx) = join(&registry, "alice", "lobby", 16).await;
        let (_bob, mut bob_rx) = join(&registry, "bob", "lobby", 16).await;

        // when (操作):
        for i in 0..10 {
            usecase
                .execute(&lobby(), Some(&alice), &format!("m{i}"))
                .await;
        }

        // then (期待する結果):
        for i in 0..10 {
            assert_eq!(bob_rx.recv().await, Some(format!("m{i}")));
        }
    }

    #[tokio::test]
    async fn test_broadcast_to_unknown_room_is_noop() {
        // テスト項目: 存在しないルームへのブロードキャストは何もしない
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let usecase = BroadcastUseCase::new(registry);

        // when (操作):
        let report = usecase.execute(&lobby(), None, "payload").await;

        // then (期待する結果):
        assert_eq!(report, BroadcastReport::default());
    }
}
