//! UseCase: 認証してルームに入室する
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 認証成功時の登録、認証失敗時に登録されないこと
//! - 同一 identity の重複セッションの扱い（既定では共存、設定で追い出し）
//!
//! ### なぜこのテストが必要か
//! - 拒否されたハンドシェイクの接続がルームに現れてはならない
//! - 認証の待ち時間中にルームのロックを保持してはならない

use std::sync::Arc;

use jigger_shared::time::Clock;

use crate::domain::{
    Connection, ConnectionId, Departure, Identity, Member, PusherChannel, RoomId, RoomRegistry,
    Timestamp,
};

use super::{authenticate::AuthenticateUseCase, error::JoinError};

/// 入室結果
#[derive(Debug, Clone)]
pub struct JoinedRoom {
    /// 認証済みの接続
    pub connection: Connection,
    pub room_id: RoomId,
    /// 入室直後のメンバー一覧（参加順、自分を含む）
    pub members: Vec<Member>,
    /// 追い出した同一 identity の旧セッション
    pub evicted: Vec<Departure>,
}

/// 入室のユースケース
pub struct JoinRoomUseCase {
    authenticate: Arc<AuthenticateUseCase>,
    /// RoomRegistry（メンバー管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    clock: Arc<dyn Clock>,
    /// 同じ identity の旧セッションを追い出すか
    evict_duplicate_identity: bool,
}

impl JoinRoomUseCase {
    pub fn new(
        authenticate: Arc<AuthenticateUseCase>,
        registry: Arc<dyn RoomRegistry>,
        clock: Arc<dyn Clock>,
        evict_duplicate_identity: bool,
    ) -> Self {
        Self {
            authenticate,
            registry,
            clock,
            evict_duplicate_identity,
        }
    }

    /// 入室を実行
    ///
    /// 認証はルームの状態に触れる前に完了させる。
    ///
    /// # Arguments
    ///
    /// * `token` - クライアントが提示したトークン
    /// * `identity` - クライアントが申告した identity
    /// * `room_id` - 入室先のルーム
    /// * `channel` - この接続への送信チャンネル
    pub async fn execute(
        &self,
        token: &str,
        identity: Identity,
        room_id: RoomId,
        channel: PusherChannel,
    ) -> Result<JoinedRoom, JoinError> {
        // 1. 認証（ロックは一切保持しない）
        let claims = self.authenticate.execute(token, &identity).await?;

        // 2. 必要なら旧セッションを追い出す
        let evicted = if self.evict_duplicate_identity {
            self.evict_sessions_of(&identity).await
        } else {
            Vec::new()
        };

        // 3. 登録
        let connection = Connection::from_claims(
            ConnectionId::generate(),
            identity,
            &claims,
            Timestamp::new(self.clock.now_millis()),
        );
        let members = self
            .registry
            .join(connection.clone(), channel, room_id.clone())
            .await?;

        tracing::info!(
            "'{}' ({:?}) joined room '{}' ({} members)",
            connection.identity,
            connection.display_name,
            room_id,
            members.len()
        );

        Ok(JoinedRoom {
            connection,
            room_id,
            members,
            evicted,
        })
    }

    async fn evict_sessions_of(&self, identity: &Identity) -> Vec<Departure> {
        let mut departures = Vec::new();
        for previous in self.registry.sessions_of(identity).await {
            previous.channel.close();
            if let Some(departure) = self.registry.leave(&previous.id()).await {
                tracing::info!(
                    "Evicted previous session '{}' of '{}' from room '{}'",
                    previous.id(),
                    identity,
                    departure.room_id
                );
                departures.push(departure);
            }
        }
        departures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use jigger_shared::time::FixedClock;

    use crate::{
        domain::{AuthClaims, AuthError, MockAuthVerifier, outbound},
        infrastructure::registry::InMemoryRoomRegistry,
    };

    fn claims_for(subject: &str) -> AuthClaims {
        AuthClaims {
            subject: subject.to_string(),
            numeric_user_id: Some(100),
            display_name: Some(format!("{subject}-name")),
            application: Some("desktop_app".to_string()),
            session_id: None,
            expiry: None,
            issued_at: None,
            token_id: None,
        }
    }

    /// トークン "valid" のみ受理し、subject は申告 identity を返すモック
    fn accepting_verifier() -> MockAuthVerifier {
        let mut verifier = MockAuthVerifier::new();
        verifier.expect_verify().returning(|token, claimed| {
            if token == "valid" {
                Ok(claims_for(claimed.as_str()))
            } else {
                Err(AuthError::Rejected("valid=false".to_string()))
            }
        });
        verifier
    }

    fn create_usecase(
        verifier: MockAuthVerifier,
        evict: bool,
    ) -> (JoinRoomUseCase, Arc<InMemoryRoomRegistry>) {
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let authenticate = Arc::new(AuthenticateUseCase::new(
            Arc::new(verifier),
            Duration::from_secs(1),
        ));
        let usecase = JoinRoomUseCase::new(
            authenticate,
            registry.clone(),
            Arc::new(FixedClock::new(5_000)),
            evict,
        );
        (usecase, registry)
    }

    fn identity(value: &str) -> Identity {
        Identity::new(value.to_string()).unwrap()
    }

    fn lobby() -> RoomId {
        RoomId::new("lobby".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_join_success_registers_enriched_connection() {
        // テスト項目: 認証成功で claims 付きの接続がルームに登録される
        // given (前提条件):
        let (usecase, registry) = create_usecase(accepting_verifier(), false);
        let (tx, _rx) = outbound::channel(8);

        // when (操作):
        let joined = usecase
            .execute("valid", identity("alice"), lobby(), tx)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(joined.connection.identity, identity("alice"));
        assert_eq!(joined.connection.numeric_user_id, Some(100));
        assert_eq!(joined.connection.display_name.as_deref(), Some("alice-name"));
        assert_eq!(joined.connection.connected_at, Timestamp::new(5_000));
        assert_eq!(joined.members.len(), 1);
        assert_eq!(
            registry.room_of(&joined.connection.id).await,
            Some(lobby())
        );
        assert!(joined.evicted.is_empty());
    }

    #[tokio::test]
    async fn test_join_second_member_sees_first() {
        // テスト項目: 後から入室した接続のメンバー一覧に先に入室した接続が含まれる
        // given (前提条件):
        let (usecase, _registry) = create_usecase(accepting_verifier(), false);
        let (tx1, _rx1) = outbound::channel(8);
        let (tx2, _rx2) = outbound::channel(8);
        let alice = usecase
            .execute("valid", identity("alice"), lobby(), tx1)
            .await
            .unwrap();

        // when (操作):
        let bob = usecase
            .execute("valid", identity("bob"), lobby(), tx2)
            .await
            .unwrap();

        // then (期待する結果):
        let ids: Vec<ConnectionId> = bob.members.iter().map(Member::id).collect();
        assert_eq!(ids, vec![alice.connection.id, bob.connection.id]);
    }

    #[tokio::test]
    async fn test_rejected_join_is_never_registered() {
        // テスト項目: 認証に失敗した接続はどのルームにも現れない
        // given (前提条件):
        let (usecase, registry) = create_usecase(accepting_verifier(), false);
        let (tx, _rx) = outbound::channel(8);

        // when (操作):
        let result = usecase.execute("forged", identity("alice"), lobby(), tx).await;

        // then (期待する結果):
        assert!(matches!(result, Err(JoinError::Auth(AuthError::Rejected(_)))));
        assert_eq!(result.unwrap_err().reason(), "invalid_token");
        assert!(registry.snapshot_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_token_of_other_identity_is_rejected() {
        // テスト項目: 他人のトークンでのなりすましは拒否され、登録されない
        // given (前提条件):
        let mut verifier = MockAuthVerifier::new();
        verifier
            .expect_verify()
            .returning(|_, _| Ok(claims_for("bob")));
        let (usecase, registry) = create_usecase(verifier, false);
        let (tx, _rx) = outbound::channel(8);

        // when (操作):
        let result = usecase
            .execute("bobs-token", identity("alice"), lobby(), tx)
            .await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(JoinError::Auth(AuthError::IdentityMismatch { .. }))
        ));
        assert!(registry.snapshot_members(&lobby()).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_identity_coexists_by_default() {
        // テスト項目: 既定では同じ identity の再接続は別メンバーとして共存する
        // given (前提条件):
        let (usecase, registry) = create_usecase(accepting_verifier(), false);
        let (tx1, _rx1) = outbound::channel(8);
        let (tx2, _rx2) = outbound::channel(8);
        usecase
            .execute("valid", identity("alice"), lobby(), tx1)
            .await
            .unwrap();

        // when (操作):
        let second = usecase
            .execute("valid", identity("alice"), lobby(), tx2)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(second.evicted.is_empty());
        assert_eq!(registry.snapshot_members(&lobby()).await.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_identity_evicts_previous_session_when_enabled() {
        // テスト項目: 追い出し設定時は旧セッションが閉じられルームから外される
        // given (前提条件):
        let (usecase, registry) = create_usecase(accepting_verifier(), true);
        let (tx1, mut rx1) = outbound::channel(8);
        let (tx2, _rx2) = outbound::channel(8);
        let first = usecase
            .execute("valid", identity("alice"), lobby(), tx1)
            .await
            .unwrap();

        // when (操作):
        let second = usecase
            .execute(
                "valid",
                identity("alice"),
                RoomId::new("arena".to_string()).unwrap(),
                tx2,
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(second.evicted.len(), 1);
        assert_eq!(second.evicted[0].connection.id, first.connection.id);
        assert!(second.evicted[0].room_removed);
        assert_eq!(rx1.recv().await, None);
        assert_eq!(registry.room_of(&first.connection.id).await, None);
        let rooms = registry.snapshot_rooms().await;
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].room_id.as_str(), "arena");
    }
}
