//! In-memory room registry.
//!
//! All state sits behind one mutex: the room map and the connection -> room
//! index are always mutated together, so membership and back-references can
//! never disagree. The lock is never held across an await on anything other
//! than itself.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use jigger_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, Departure, Identity, Member, PusherChannel, RegistryError, RoomId,
    RoomRegistry, RoomSummary, Timestamp,
};

struct Room {
    members: Vec<Member>,
    created_at: Timestamp,
}

#[derive(Default)]
struct RegistryState {
    rooms: HashMap<RoomId, Room>,
    /// Back-reference of every joined connection.
    memberships: HashMap<ConnectionId, RoomId>,
}

impl RegistryState {
    /// Verify the two structural invariants, returning a description of the
    /// first violation found.
    #[cfg(test)]
    fn check_invariants(&self) -> Result<(), String> {
        for (room_id, room) in &self.rooms {
            if room.members.is_empty() {
                return Err(format!("room '{room_id}' exists without members"));
            }
            for member in &room.members {
                match self.memberships.get(&member.id()) {
                    Some(back_ref) if back_ref == room_id => {}
                    other => {
                        return Err(format!(
                            "member '{}' of '{room_id}' has back-reference {other:?}",
                            member.id()
                        ));
                    }
                }
            }
        }
        for (connection_id, room_id) in &self.memberships {
            let listed = self
                .rooms
                .get(room_id)
                .is_some_and(|room| room.members.iter().any(|m| m.id() == *connection_id));
            if !listed {
                return Err(format!(
                    "connection '{connection_id}' points at '{room_id}' but is not a member"
                ));
            }
        }
        Ok(())
    }
}

/// Process-wide registry, shared by reference with every session.
pub struct InMemoryRoomRegistry {
    state: Mutex<RegistryState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            clock,
        }
    }

    #[cfg(test)]
    async fn check_invariants(&self) -> Result<(), String> {
        self.state.lock().await.check_invariants()
    }
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn join(
        &self,
        connection: Connection,
        channel: PusherChannel,
        room_id: RoomId,
    ) -> Result<Vec<Member>, RegistryError> {
        let mut state = self.state.lock().await;

        if state.memberships.contains_key(&connection.id) {
            return Err(RegistryError::AlreadyJoined(connection.id));
        }

        let connection_id = connection.id;
        let created_at = Timestamp::new(self.clock.now_millis());
        let room = state.rooms.entry(room_id.clone()).or_insert_with(|| {
            tracing::info!("Room '{}' created", room_id);
            Room {
                members: Vec::new(),
                created_at,
            }
        });
        room.members.push(Member::new(connection, channel));
        let snapshot = room.members.clone();
        state.memberships.insert(connection_id, room_id);

        Ok(snapshot)
    }

    async fn leave(&self, connection_id: &ConnectionId) -> Option<Departure> {
        let mut state = self.state.lock().await;

        let room_id = state.memberships.remove(connection_id)?;
        let Some(room) = state.rooms.get_mut(&room_id) else {
            // Unreachable while the invariants hold.
            tracing::error!(
                "Connection '{}' referenced missing room '{}'",
                connection_id,
                room_id
            );
            return None;
        };

        let position = room.members.iter().position(|m| m.id() == *connection_id)?;
        let member = room.members.remove(position);
        let remaining = room.members.clone();
        let room_removed = remaining.is_empty();
        if room_removed {
            state.rooms.remove(&room_id);
            tracing::info!("Room '{}' removed (no members left)", room_id);
        }

        Some(Departure {
            connection: member.connection,
            room_id,
            remaining,
            room_removed,
        })
    }

    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let state = self.state.lock().await;
        state.memberships.get(connection_id).cloned()
    }

    async fn snapshot_members(&self, room_id: &RoomId) -> Vec<Member> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .map(|room| room.members.clone())
            .unwrap_or_default()
    }

    async fn snapshot_rooms(&self) -> Vec<RoomSummary> {
        let state = self.state.lock().await;
        let mut rooms: Vec<RoomSummary> = state
            .rooms
            .iter()
            .map(|(room_id, room)| RoomSummary {
                room_id: room_id.clone(),
                member_count: room.members.len(),
                created_at: room.created_at,
            })
            .collect();
        rooms.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        rooms
    }

    async fn sessions_of(&self, identity: &Identity) -> Vec<Member> {
        let state = self.state.lock().await;
        state
            .rooms
            .values()
            .flat_map(|room| room.members.iter())
            .filter(|member| member.connection.identity == *identity)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outbound;
    use jigger_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - join / leave / snapshot の基本動作
    // - 空になったルームが即座に削除されること
    // - 並行実行下でもメンバー集合と逆参照が食い違わないこと
    //
    // 【なぜこのテストが必要か】
    // - Registry は全セッションが共有する唯一の可変状態
    // - ロック規律が崩れると空ルームや宙に浮いた逆参照が残る
    // ========================================

    fn create_test_registry() -> InMemoryRoomRegistry {
        InMemoryRoomRegistry::with_clock(Arc::new(FixedClock::new(1_000)))
    }

    fn connection(identity: &str) -> Connection {
        Connection::new(
            ConnectionId::generate(),
            Identity::new(identity.to_string()).unwrap(),
            Timestamp::new(1_000),
        )
    }

    fn room(name: &str) -> RoomId {
        RoomId::new(name.to_string()).unwrap()
    }

    fn pusher() -> PusherChannel {
        let (tx, _rx) = outbound::channel(8);
        tx
    }

    #[tokio::test]
    async fn test_join_creates_room_and_sets_back_reference() {
        // テスト項目: 初回 join でルームが作成され、逆参照が設定される
        // given (前提条件):
        let registry = create_test_registry();
        let alice = connection("alice");
        let alice_id = alice.id;

        // when (操作):
        let members = registry.join(alice, pusher(), room("lobby")).await.unwrap();

        // then (期待する結果):
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id(), alice_id);
        assert_eq!(registry.room_of(&alice_id).await, Some(room("lobby")));
        let rooms = registry.snapshot_rooms().await;
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].room_id, room("lobby"));
        assert_eq!(rooms[0].member_count, 1);
        assert_eq!(rooms[0].created_at, Timestamp::new(1_000));
    }

    #[tokio::test]
    async fn test_join_returns_members_in_join_order() {
        // テスト項目: join の戻り値は参加順のメンバー一覧（自分を含む）
        // given (前提条件):
        let registry = create_test_registry();
        let alice = connection("alice");
        let bob = connection("bob");
        let (alice_id, bob_id) = (alice.id, bob.id);
        registry.join(alice, pusher(), room("lobby")).await.unwrap();

        // when (操作):
        let members = registry.join(bob, pusher(), room("lobby")).await.unwrap();

        // then (期待する結果):
        let ids: Vec<ConnectionId> = members.iter().map(Member::id).collect();
        assert_eq!(ids, vec![alice_id, bob_id]);
    }

    #[tokio::test]
    async fn test_join_twice_is_rejected() {
        // テスト項目: 既にルームに所属している接続の再 join はエラーになる
        // given (前提条件):
        let registry = create_test_registry();
        let alice = connection("alice");
        registry
            .join(alice.clone(), pusher(), room("lobby"))
            .await
            .unwrap();

        // when (操作):
        let result = registry.join(alice.clone(), pusher(), room("other")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RegistryError::AlreadyJoined(id)) if id == alice.id));
        assert_eq!(registry.snapshot_rooms().await.len(), 1);
        assert!(registry.check_invariants().await.is_ok());
    }

    #[tokio::test]
    async fn test_same_identity_creates_distinct_members() {
        // テスト項目: 同じ identity の再接続は別メンバーとして登録される
        // given (前提条件):
        let registry = create_test_registry();

        // when (操作):
        registry
            .join(connection("alice"), pusher(), room("lobby"))
            .await
            .unwrap();
        registry
            .join(connection("alice"), pusher(), room("lobby"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(registry.snapshot_members(&room("lobby")).await.len(), 2);
        let identity = Identity::new("alice".to_string()).unwrap();
        assert_eq!(registry.sessions_of(&identity).await.len(), 2);
    }

    #[tokio::test]
    async fn test_leave_last_member_removes_room() {
        // テスト項目: 最後のメンバーが抜けるとルームが削除される
        // given (前提条件):
        let registry = create_test_registry();
        let alice = connection("alice");
        let alice_id = alice.id;
        registry.join(alice, pusher(), room("lobby")).await.unwrap();

        // when (操作):
        let departure = registry.leave(&alice_id).await.unwrap();

        // then (期待する結果):
        assert!(departure.room_removed);
        assert!(departure.remaining.is_empty());
        assert_eq!(departure.room_id, room("lobby"));
        assert!(registry.snapshot_rooms().await.is_empty());
        assert_eq!(registry.room_of(&alice_id).await, None);
    }

    #[tokio::test]
    async fn test_leave_keeps_room_with_remaining_members() {
        // テスト項目: 他のメンバーが残っていればルームは維持される
        // given (前提条件):
        let registry = create_test_registry();
        let alice = connection("alice");
        let bob = connection("bob");
        let (alice_id, bob_id) = (alice.id, bob.id);
        registry.join(alice, pusher(), room("lobby")).await.unwrap();
        registry.join(bob, pusher(), room("lobby")).await.unwrap();

        // when (操作):
        let departure = registry.leave(&alice_id).await.unwrap();

        // then (期待する結果):
        assert!(!departure.room_removed);
        assert_eq!(departure.remaining.len(), 1);
        assert_eq!(departure.remaining[0].id(), bob_id);
        assert_eq!(registry.snapshot_rooms().await[0].member_count, 1);
    }

    #[tokio::test]
    async fn test_leave_without_room_is_noop() {
        // テスト項目: ルームに所属していない接続の leave は何もしない（冪等性）
        // given (前提条件):
        let registry = create_test_registry();
        let alice = connection("alice");
        let alice_id = alice.id;
        registry.join(alice, pusher(), room("lobby")).await.unwrap();
        registry.leave(&alice_id).await.unwrap();

        // when (操作):
        let second = registry.leave(&alice_id).await;
        let unknown = registry.leave(&ConnectionId::generate()).await;

        // then (期待する結果):
        assert!(second.is_none());
        assert!(unknown.is_none());
        assert!(registry.check_invariants().await.is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_rooms_is_sorted_by_room_id() {
        // テスト項目: ルーム一覧はルーム ID 順に並ぶ
        // given (前提条件):
        let registry = create_test_registry();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .join(connection(name), pusher(), room(name))
                .await
                .unwrap();
        }

        // when (操作):
        let rooms = registry.snapshot_rooms().await;

        // then (期待する結果):
        let names: Vec<&str> = rooms.iter().map(|r| r.room_id.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_snapshot_members_of_unknown_room_is_empty() {
        // テスト項目: 存在しないルームのスナップショットは空
        // given (前提条件):
        let registry = create_test_registry();

        // when (操作):
        let members = registry.snapshot_members(&room("nowhere")).await;

        // then (期待する結果):
        assert!(members.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_join_leave_keeps_invariants() {
        // テスト項目: 並行した join / leave の後も全ルームが非空で逆参照が一致する
        // given (前提条件):
        let registry = Arc::new(create_test_registry());
        let rooms = ["lobby", "arena", "garden"];

        // when (操作):
        let mut handles = Vec::new();
        for worker in 0..32usize {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let mut joined = Vec::new();
                for step in 0..40usize {
                    // Interleave joins and leaves differently in every worker.
                    if (worker + step) % 3 == 0 && !joined.is_empty() {
                        let id: ConnectionId = joined.remove((worker * step) % joined.len());
                        registry.leave(&id).await;
                    } else {
                        let c = connection(&format!("w{worker}-s{step}"));
                        joined.push(c.id);
                        let target = room(rooms[(worker * 7 + step) % rooms.len()]);
                        registry.join(c, pusher(), target).await.unwrap();
                    }
                    tokio::task::yield_now().await;
                }
                // Half of the workers leave everything behind.
                if worker % 2 == 0 {
                    for id in joined {
                        registry.leave(&id).await;
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // then (期待する結果):
        assert_eq!(registry.check_invariants().await, Ok(()));
        for summary in registry.snapshot_rooms().await {
            assert!(summary.member_count > 0);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_to_same_room_are_all_registered() {
        // テスト項目: 同じルームへの同時 join が取りこぼしなく登録される
        // given (前提条件):
        let registry = Arc::new(create_test_registry());

        // when (操作):
        let handles: Vec<_> = (0..50)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    registry
                        .join(connection(&format!("p{i}")), pusher(), room("lobby"))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // then (期待する結果):
        assert_eq!(registry.snapshot_members(&room("lobby")).await.len(), 50);
        assert_eq!(registry.check_invariants().await, Ok(()));
    }
}
