//! `AuthVerifier` backed by the platform identity service over HTTP.

use async_trait::async_trait;

use crate::{
    config::AuthConfig,
    domain::{AuthClaims, AuthError, AuthVerifier, Identity},
    infrastructure::dto::auth::{VerifyRequest, VerifyResponse},
};

/// Header carrying the internal API key expected by the identity service.
const INTERNAL_AUTH_HEADER: &str = "X-Internal-Auth";

/// Verifies tokens with `POST <endpoint>` and a bounded timeout.
pub struct HttpAuthVerifier {
    client: reqwest::Client,
    config: AuthConfig,
}

impl HttpAuthVerifier {
    pub fn new(config: AuthConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl AuthVerifier for HttpAuthVerifier {
    async fn verify(&self, token: &str, claimed: &Identity) -> Result<AuthClaims, AuthError> {
        let body = VerifyRequest {
            token: token.to_string(),
            app_id: self.config.app_id.clone(),
        };

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.internal_api_key {
            request = request.header(INTERNAL_AUTH_HEADER, key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AuthError::Timeout
            } else {
                AuthError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Identity service answered {} for '{}'", status, claimed);
            return Err(AuthError::Rejected(format!("status {}", status.as_u16())));
        }

        let verified: VerifyResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AuthError::Timeout
            } else {
                AuthError::InvalidResponse(e.to_string())
            }
        })?;

        if !verified.valid {
            return Err(AuthError::Rejected("valid=false".to_string()));
        }
        if verified.openid != claimed.as_str() {
            return Err(AuthError::IdentityMismatch {
                claimed: claimed.as_str().to_string(),
                actual: verified.openid,
            });
        }

        tracing::debug!(
            "Token verified for '{}' (user_id: {:?})",
            claimed,
            verified.user_id
        );
        Ok(verified.into())
    }
}
