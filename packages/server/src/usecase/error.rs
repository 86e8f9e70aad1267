//! UseCase layer errors.

use thiserror::Error;

use crate::domain::{AuthError, RegistryError};

/// 入室（ハンドシェイク）失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("registry rejected join: {0}")]
    Registry(#[from] RegistryError),
}

impl JoinError {
    /// `auth_failed` に載せる reason
    pub fn reason(&self) -> &'static str {
        match self {
            JoinError::Auth(e) => e.reason(),
            JoinError::Registry(_) => "join_failed",
        }
    }
}

/// ルーム詳細取得の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}
