//! UseCase: トークン検証
//!
//! ハンドシェイク時と、設定によってはメッセージごとの再検証で使われる。
//! 外部サービスへの問い合わせは必ず時間制限付きで、失敗はすべて拒否として扱う。

use std::{sync::Arc, time::Duration};

use crate::domain::{AuthClaims, AuthError, AuthVerifier, Identity};

/// トークン検証のユースケース
pub struct AuthenticateUseCase {
    /// AuthVerifier（認証サービスの抽象化）
    verifier: Arc<dyn AuthVerifier>,
    /// 1 回の検証に許す最大時間
    timeout: Duration,
}

impl AuthenticateUseCase {
    pub fn new(verifier: Arc<dyn AuthVerifier>, timeout: Duration) -> Self {
        Self { verifier, timeout }
    }

    /// `token` が `claimed` 本人のものであることを検証する
    ///
    /// # Returns
    ///
    /// * `Ok(AuthClaims)` - 検証成功（subject は必ず `claimed` と一致）
    /// * `Err(AuthError)` - 拒否・タイムアウト・接続不可
    pub async fn execute(&self, token: &str, claimed: &Identity) -> Result<AuthClaims, AuthError> {
        let claims = tokio::time::timeout(self.timeout, self.verifier.verify(token, claimed))
            .await
            .map_err(|_| AuthError::Timeout)??;

        if claims.subject != claimed.as_str() {
            return Err(AuthError::IdentityMismatch {
                claimed: claimed.as_str().to_string(),
                actual: claims.subject,
            });
        }

        Ok(claims)
    }
}
