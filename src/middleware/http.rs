//! Transport-level middleware applied around the dispatch fallback.
//!
//! - Request-Id generation + propagation (`x-request-id`)
//! - Access logging (TraceLayer)
//! - Body size limit: 1 MiB
//! - Timeout: 30 seconds, answered with 408
//! - Error responses produced by these layers get the same JSON envelope as the
//!   dispatcher's

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header, header::HeaderName};
use axum::response::{IntoResponse, Response};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn apply(router: Router) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                AppError::status(StatusCode::REQUEST_TIMEOUT, "Request Timeout").into_response()
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                AppError::Internal.into_response()
            }
        }))
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http());

    // Outermost: sees the responses produced by `layers` too.
    router
        .layer(layers)
        .layer(axum::middleware::map_response(envelope_errors))
}

/// Rewrites non-JSON 4xx/5xx responses (body limit, extractor rejections) into the
/// failure envelope, keeping the request id.
async fn envelope_errors(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let reason = status.canonical_reason().unwrap_or("Unknown");
    let mut enveloped = AppError::status(status, reason).into_response();
    if let Some(id) = response.headers().get(REQUEST_ID_HEADER) {
        enveloped.headers_mut().insert(REQUEST_ID_HEADER, id.clone());
    }
    enveloped
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn plain_error_gets_envelope_and_keeps_request_id() {
        let plain = Response::builder()
            .status(StatusCode::PAYLOAD_TOO_LARGE)
            .header(header::CONTENT_TYPE, "text/plain")
            .header(REQUEST_ID_HEADER, "req-1")
            .body(Body::from("length limit exceeded"))
            .unwrap();

        let response = envelope_errors(plain).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-1");
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["content"]["code"], "413");
        assert_eq!(body["content"]["message"], "Payload Too Large");
    }

    #[tokio::test]
    async fn json_and_success_responses_pass_through() {
        let ok = Response::builder().status(StatusCode::OK).body(Body::empty()).unwrap();
        assert_eq!(envelope_errors(ok).await.status(), StatusCode::OK);

        let json = AppError::Forbidden.into_response();
        let body = body_json(envelope_errors(json).await).await;
        assert_eq!(body["content"]["message"], "Forbidden");
    }
}
