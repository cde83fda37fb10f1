use std::path::PathBuf;

use super::key_store::KeyStore;
use super::token::{ClaimPolicy, Claims, ParsedToken, TokenError};

/// Validates a raw bearer token and returns its claims.
pub trait TokenValidator: Send + Sync {
    fn check_token(&self, token: &str) -> Result<Claims, TokenError>;
}

/// HS256 access-token verifier keyed by application name.
///
/// Key material is never held in memory between calls.
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    app_name: String,
    key_store: KeyStore,
    leeway_seconds: i64,
}

impl JwtVerifier {
    pub fn new(app_name: impl Into<String>, keys_path: impl Into<PathBuf>, leeway_seconds: u64) -> Self {
        Self {
            app_name: app_name.into(),
            key_store: KeyStore::new(keys_path),
            leeway_seconds: i64::try_from(leeway_seconds).unwrap_or(i64::MAX),
        }
    }

    fn policy(&self) -> ClaimPolicy {
        ClaimPolicy {
            audience: self.app_name.clone(),
            leeway_seconds: self.leeway_seconds,
        }
    }

    pub fn check_token_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let checked = ParsedToken::parse(token)?.check_header()?;
        let key = self.key_store.load(&self.app_name)?;
        checked
            .verify_signature(&key)?
            .check_claims(&self.policy(), now)
    }
}

impl TokenValidator for JwtVerifier {
    fn check_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.check_token_at(token, chrono::Utc::now().timestamp())
    }
}
