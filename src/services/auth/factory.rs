/// Factory: build the token validator from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{JwtVerifier, TokenValidator};

pub fn build_token_validator(config: &Config) -> Arc<dyn TokenValidator> {
    Arc::new(JwtVerifier::new(
        &config.app_name,
        &config.keys_path,
        config.token_leeway_seconds,
    ))
}
