//! Authentication contract with the external identity service.

use async_trait::async_trait;

use super::{error::AuthError, value_object::Identity};

/// Verified identity attributes returned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthClaims {
    /// Authenticated subject (`openid`). Always equal to the claimed identity
    /// once verification succeeded.
    pub subject: String,
    pub numeric_user_id: Option<u64>,
    pub display_name: Option<String>,
    pub application: Option<String>,
    pub session_id: Option<String>,
    pub expiry: Option<i64>,
    pub issued_at: Option<i64>,
    pub token_id: Option<String>,
}

/// Verifies a token on behalf of a claimed identity.
///
/// Implementations must fail closed: anything other than a positive answer
/// whose subject equals `claimed` is an [`AuthError`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, token: &str, claimed: &Identity) -> Result<AuthClaims, AuthError>;
}
