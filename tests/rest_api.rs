//! End-to-end tests through the full router: fallback entry, middleware stack,
//! route map build, bearer gate and the bundled endpoint modules.

use std::collections::HashMap;
use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use rest_dispatch::app::{build_router, build_state};
use rest_dispatch::config::Config;
use rest_dispatch::endpoints::NAMESPACE;
use rest_dispatch::routing::route_map::CACHE_FILE_NAME;

const APP: &str = "rest-app";
const SECRET: &[u8] = b"integration-secret-0123456789abc";

struct TestApp {
    router: Router,
    cache: TempDir,
    _endpoints: TempDir,
    _keys: TempDir,
}

fn test_app() -> TestApp {
    let endpoints = tempfile::tempdir().unwrap();
    std::fs::write(endpoints.path().join("status.rs"), "").unwrap();
    std::fs::write(endpoints.path().join("profile.rs"), "").unwrap();

    let keys = tempfile::tempdir().unwrap();
    std::fs::write(
        keys.path().join(format!("{APP}.cache")),
        json!({"kty": "oct", "k": URL_SAFE_NO_PAD.encode(SECRET)}).to_string(),
    )
    .unwrap();

    let cache = tempfile::tempdir().unwrap();

    let config = config(&[
        ("REST_CACHE_PATH", cache.path()),
        ("REST_ENDPOINT_PATH", endpoints.path()),
        ("KEYS_PATH", keys.path()),
    ]);
    let state = build_state(&config).unwrap();

    TestApp {
        router: build_router(state, &config),
        cache,
        _endpoints: endpoints,
        _keys: keys,
    }
}

fn config(paths: &[(&str, &Path)]) -> Config {
    let mut env: HashMap<String, String> = paths
        .iter()
        .map(|(k, v)| (k.to_string(), v.display().to_string()))
        .collect();
    env.insert("REST_NAMESPACE".into(), NAMESPACE.into());
    env.insert("REST_PATH_PREFIX".into(), "/api".into());
    env.insert("APP_NAME".into(), APP.into());
    Config::from_lookup(|key: &str| env.get(key).cloned()).unwrap()
}

fn token(exp_offset: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "iss": "tests", "sub": "user-42", "aud": [APP, "other"],
            "iat": now, "exp": now + exp_offset,
        }),
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, content_type, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn open_route_is_served_as_json() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(get("/api/status/ping?verbose=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let (status, content_type, body) = send(&app, get("/api/status/ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json; charset=utf-8"));
    assert_eq!(body["success"], true);
    assert_eq!(body["content"]["status"], "ok");
}

#[tokio::test]
async fn route_map_is_persisted_at_startup() {
    let app = test_app();
    let raw = std::fs::read_to_string(app.cache.path().join(CACHE_FILE_NAME)).unwrap();
    let map: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(map["GET"]["status/ping"], "ping@status");
    assert_eq!(map["POST"]["profile/echo"], "echo@profile");
    assert!(map["GET"].get("profile/audit").is_none());
    assert!(map.get("POST").and_then(|m| m.get("status/reset")).is_none());
}

#[tokio::test]
async fn unmapped_routes_are_not_found() {
    let app = test_app();
    for uri in ["/api/status/missing", "/api/profile/audit", "/api/status/reset"] {
        let (status, _, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["success"], false);
        assert_eq!(body["content"]["code"], "404");
        assert_eq!(body["content"]["message"], "invalid rest-service target");
    }
}

#[tokio::test]
async fn protected_route_requires_valid_bearer() {
    let app = test_app();

    let (status, _, body) = send(&app, get("/api/profile/me")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["content"]["message"], "Forbidden");

    let expired = Request::builder()
        .uri("/api/profile/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token(-3600)))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, expired).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let fresh = Request::builder()
        .uri("/api/profile/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token(300)))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, fresh).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["sub"], "user-42");
    assert_eq!(body["content"]["iss"], "tests");
}

#[tokio::test]
async fn json_body_reaches_handler() {
    let app = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/profile/echo")
        .header(header::AUTHORIZATION, format!("Bearer {}", token(300)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"hello":"world"}"#))
        .unwrap();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["echo"]["hello"], "world");

    let broken = Request::builder()
        .method("POST")
        .uri("/api/profile/echo")
        .header(header::AUTHORIZATION, format!("Bearer {}", token(300)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, _) = send(&app, broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn options_returns_empty_ok() {
    let app = test_app();
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/anything/at/all")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn oversized_body_is_rejected_with_envelope() {
    let app = test_app();
    let body = vec![b'a'; 2 * 1024 * 1024];
    let req = Request::builder()
        .method("POST")
        .uri("/api/profile/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();
    let (status, content_type, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(content_type.as_deref(), Some("application/json; charset=utf-8"));
    assert_eq!(body["success"], false);
    assert_eq!(body["content"]["code"], "413");
}
