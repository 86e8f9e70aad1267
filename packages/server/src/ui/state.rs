//! Shared application state.

use std::sync::Arc;

use jigger_shared::time::{Clock, SystemClock};

use crate::{
    config::{RelayConfig, SessionConfig},
    domain::{AuthVerifier, Catalog, RoomRegistry},
    usecase::{
        AuthenticateUseCase, BroadcastUseCase, CatalogUseCase, GetRoomDetailUseCase,
        JoinRoomUseCase, LeaveRoomUseCase, ListRoomsUseCase,
    },
};

/// Shared application state
///
/// One instance per server. Every handler receives it through axum's `State`
/// extractor, so independent servers (e.g. in tests) never share rooms.
pub struct AppState {
    /// AuthenticateUseCase（トークン検証、再検証にも使う）
    pub authenticate_usecase: Arc<AuthenticateUseCase>,
    /// JoinRoomUseCase（入室のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（退室のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// BroadcastUseCase（ルーム内ブロードキャスト）
    pub broadcast_usecase: Arc<BroadcastUseCase>,
    /// ListRoomsUseCase（ルーム一覧取得）
    pub list_rooms_usecase: Arc<ListRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// CatalogUseCase（背包・商城）
    pub catalog_usecase: Arc<CatalogUseCase>,
    /// 接続ごとのセッション設定
    pub session: SessionConfig,
}

impl AppState {
    /// Wire every use case around the given collaborators.
    pub fn new(
        config: &RelayConfig,
        verifier: Arc<dyn AuthVerifier>,
        registry: Arc<dyn RoomRegistry>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self::with_clock(config, verifier, registry, catalog, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &RelayConfig,
        verifier: Arc<dyn AuthVerifier>,
        registry: Arc<dyn RoomRegistry>,
        catalog: Arc<dyn Catalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let authenticate_usecase = Arc::new(AuthenticateUseCase::new(verifier, config.auth.timeout));
        let broadcast_usecase = Arc::new(BroadcastUseCase::new(registry.clone()));

        Self {
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                authenticate_usecase.clone(),
                registry.clone(),
                clock,
                config.session.evict_duplicate_identity,
            )),
            leave_room_usecase: Arc::new(LeaveRoomUseCase::new(
                registry.clone(),
                broadcast_usecase.clone(),
            )),
            list_rooms_usecase: Arc::new(ListRoomsUseCase::new(registry.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(registry)),
            catalog_usecase: Arc::new(CatalogUseCase::new(catalog)),
            authenticate_usecase,
            broadcast_usecase,
            session: config.session.clone(),
        }
    }
}
