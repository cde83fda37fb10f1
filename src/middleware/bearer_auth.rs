/*
 * Responsibility
 * - Bearer トークンの検証ゲート (要否判定 → ヘッダ抽出 → 検証 → 拒否)
 * - Decides per operation whether a token is needed and turns every failure into an
 *   opaque Forbidden; the cause is only logged.
 */
use std::sync::Arc;

use crate::error::AppError;
use crate::routing::Operation;
use crate::services::auth::{Claims, TokenValidator};

#[derive(Clone)]
pub struct AuthGate {
    validator: Arc<dyn TokenValidator>,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

impl AuthGate {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self { validator }
    }

    /// `Ok(None)` when the operation is open, `Ok(Some(claims))` once a required token
    /// has been accepted.
    pub fn check(&self, operation: &Operation, authorization: &str) -> Result<Option<Claims>, AppError> {
        if !(operation.is_public() && operation.auth_required()) {
            return Ok(None);
        }

        let token = bearer_token(authorization).ok_or_else(|| {
            tracing::warn!(operation = operation.symbol(), "missing bearer token");
            AppError::Forbidden
        })?;

        match self.validator.check_token(&token) {
            Ok(claims) => Ok(Some(claims)),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    stage = ?err.stage(),
                    operation = operation.symbol(),
                    "access token verification failed"
                );
                Err(AppError::Forbidden)
            }
        }
    }
}

/// The header must contain `Bearer`; every `"Bearer "` is then removed.
pub fn bearer_token(authorization: &str) -> Option<String> {
    if !authorization.contains("Bearer") {
        return None;
    }
    Some(authorization.replace("Bearer ", ""))
}
