//! Domain error types.

use thiserror::Error;

use super::value_object::ConnectionId;

/// Validation errors raised when building value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("identity must not be empty")]
    IdentityEmpty,

    #[error("identity must be at most {0} bytes")]
    IdentityTooLong(usize),

    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("room id must be at most {0} bytes")]
    RoomIdTooLong(usize),
}

/// Reasons a token verification fails. Every variant is fatal to a handshake.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The identity service answered but refused the token.
    #[error("token rejected: {0}")]
    Rejected(String),

    /// The token is valid but belongs to another subject.
    #[error("token subject '{actual}' does not match claimed identity '{claimed}'")]
    IdentityMismatch { claimed: String, actual: String },

    /// The identity service did not answer in time.
    #[error("identity service timed out")]
    Timeout,

    /// The identity service could not be reached.
    #[error("identity service unavailable: {0}")]
    Unavailable(String),

    /// The identity service answered with a body we could not decode.
    #[error("invalid response from identity service: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Machine-readable reason sent to the client in `auth_failed`.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Rejected(_) => "invalid_token",
            AuthError::IdentityMismatch { .. } => "identity_mismatch",
            AuthError::Timeout => "auth_timeout",
            AuthError::Unavailable(_) | AuthError::InvalidResponse(_) => "auth_unavailable",
        }
    }
}

/// Errors raised by room membership mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("connection '{0}' is already a member of a room")]
    AlreadyJoined(ConnectionId),
}

/// Delivery failures on a single outbound channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// The outbound buffer is full: the receiver is not draining.
    #[error("outbound buffer is full")]
    Stalled,

    /// The receiving side has gone away.
    #[error("outbound channel is closed")]
    Closed,
}
