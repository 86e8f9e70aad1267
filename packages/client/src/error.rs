//! Error types for the relay client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The relay refused the handshake. Retrying with the same token is pointless.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
