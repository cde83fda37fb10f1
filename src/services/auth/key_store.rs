use std::path::{Path, PathBuf};

use josekit::jwk::Jwk;

use super::token::TokenError;

/// Verification secrets stored as `{keys_path}/{app_name}.cache` (JWK, `kty: oct`).
///
/// The file is read on every lookup so a rotated key takes effect without a restart.
#[derive(Debug, Clone)]
pub struct KeyStore {
    keys_path: PathBuf,
}

impl KeyStore {
    pub fn new(keys_path: impl Into<PathBuf>) -> Self {
        Self {
            keys_path: keys_path.into(),
        }
    }

    pub fn key_file(&self, app_name: &str) -> PathBuf {
        key_file(&self.keys_path, app_name)
    }

    pub fn load(&self, app_name: &str) -> Result<Jwk, TokenError> {
        let path = self.key_file(app_name);
        let bytes = std::fs::read(&path)
            .map_err(|e| TokenError::KeyUnavailable(format!("{}: {}", path.display(), e)))?;
        Jwk::from_bytes(bytes).map_err(|e| TokenError::KeyUnavailable(e.to_string()))
    }
}

pub fn key_file(keys_path: &Path, app_name: &str) -> PathBuf {
    keys_path.join(format!("{app_name}.cache"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::token::tests::{APP, SECRET, jwk_json};

    #[test]
    fn loads_oct_jwk_for_app() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rest-app.cache"), jwk_json(SECRET)).unwrap();

        let jwk = KeyStore::new(dir.path()).load(APP).unwrap();
        assert_eq!(jwk.key_type(), "oct");
    }

    #[test]
    fn missing_or_garbled_key_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path());
        assert!(matches!(store.load(APP), Err(TokenError::KeyUnavailable(_))));

        std::fs::write(store.key_file(APP), "not a jwk").unwrap();
        assert!(matches!(store.load(APP), Err(TokenError::KeyUnavailable(_))));
    }
}
