//! Value objects of the relay domain.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

const MAX_IDENTITY_LEN: usize = 256;
const MAX_ROOM_ID_LEN: usize = 128;

/// Unique handle of one authenticated session.
///
/// Two sessions of the same [`Identity`] always get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Authenticated principal (the `openid` of the identity service).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::IdentityEmpty);
        }
        if value.len() > MAX_IDENTITY_LEN {
            return Err(ValueObjectError::IdentityTooLong(MAX_IDENTITY_LEN));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Identity {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a broadcast domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::RoomIdEmpty);
        }
        if value.len() > MAX_ROOM_ID_LEN {
            return Err(ValueObjectError::RoomIdTooLong(MAX_ROOM_ID_LEN));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rejects_blank_value() {
        // テスト項目: 空白のみの identity は作成できない
        // given (前提条件):
        let value = "   ".to_string();

        // when (操作):
        let result = Identity::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::IdentityEmpty));
    }

    #[test]
    fn test_identity_rejects_too_long_value() {
        // テスト項目: 上限を超える長さの identity は作成できない
        // given (前提条件):
        let value = "a".repeat(MAX_IDENTITY_LEN + 1);

        // when (操作):
        let result = Identity::try_from(value);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::IdentityTooLong(MAX_IDENTITY_LEN))
        );
    }

    #[test]
    fn test_room_id_accepts_regular_name() {
        // テスト項目: 通常のルーム名から RoomId が作成できる
        // given (前提条件):
        let value = "lobby".to_string();

        // when (操作):
        let room_id = RoomId::new(value).unwrap();

        // then (期待する結果):
        assert_eq!(room_id.as_str(), "lobby");
        assert_eq!(room_id.to_string(), "lobby");
    }

    #[test]
    fn test_room_id_rejects_empty_value() {
        // テスト項目: 空文字のルーム名は拒否される
        // given (前提条件):
        let value = String::new();

        // when (操作):
        let result = RoomId::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::RoomIdEmpty));
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: 生成される ConnectionId は毎回異なる
        // given (前提条件):
        let first = ConnectionId::generate();

        // when (操作):
        let second = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(first, second);
    }
}
