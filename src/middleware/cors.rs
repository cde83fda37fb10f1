//! CORS policy for browser clients.
//!
//! Policy:
//! - `*` in CORS_ALLOWED_ORIGINS (or an empty list outside production): any origin,
//!   WITHOUT credentials.
//! - Otherwise: exact-match allowlist WITH credentials, so the Authorization header
//!   can be sent cross-origin.
//! - Production with an empty list allows no origin at all.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24);

pub fn apply(router: Router, config: &Config) -> Router {
    router.layer(layer(config))
}

pub fn layer(config: &Config) -> CorsLayer {
    let origins = &config.cors_allowed_origins;
    let wildcard = origins.iter().any(|o| o == "*")
        || (origins.is_empty() && !config.app_env.is_production());

    // Never combine `Any` with allow_credentials(true).
    let cors = if wildcard {
        CorsLayer::new().allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
                allowed.iter().any(|v| v == origin)
            }))
            .allow_credentials(true)
    };

    cors.allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::HEAD,
        Method::OPTIONS,
    ])
    .allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static("x-request-id"),
    ])
    .max_age(PREFLIGHT_MAX_AGE)
}
