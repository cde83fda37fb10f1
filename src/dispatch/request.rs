//! Raw request data handed to the dispatcher by the transport.
//!
//! Handlers receive a reference to this and pull whatever they need from it; the
//! dispatcher never maps request data onto handler parameters.

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, Method, Uri, header};
use serde_json::Value;

use crate::error::AppError;
use crate::services::auth::Claims;

const HTTP_AUTHORIZATION: HeaderName = HeaderName::from_static("http_authorization");

/// Where the request came from. Only HTTP requests are ever dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationContext {
    #[default]
    Http,
    Cli,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Raw(Bytes),
    Json(Value),
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::Raw(Bytes::new())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestInput {
    pub method: String,
    /// Path plus optional query string, as received.
    pub uri: String,
    pub content_type: Option<String>,
    /// Trimmed authorization header, empty when absent.
    pub authorization: String,
    pub body: RequestBody,
    /// Set by the dispatcher once a bearer token has been accepted.
    pub claims: Option<Claims>,
    pub context: InvocationContext,
}

impl RequestInput {
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn cli(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            context: InvocationContext::Cli,
            ..Self::new(method, uri)
        }
    }

    pub fn from_http(method: &Method, uri: &Uri, headers: &HeaderMap, body: Bytes) -> Self {
        let uri = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            method: method.as_str().to_string(),
            uri,
            content_type,
            authorization: authorization_from(headers),
            body: RequestBody::Raw(body),
            claims: None,
            context: InvocationContext::Http,
        }
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = value.into().trim().to_string();
        self
    }

    pub fn with_body(mut self, content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.content_type = Some(content_type.into());
        self.body = RequestBody::Raw(body.into());
        self
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            RequestBody::Json(v) => Some(v),
            RequestBody::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&Bytes> {
        match &self.body {
            RequestBody::Raw(b) => Some(b),
            RequestBody::Json(_) => None,
        }
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// Replaces a raw JSON body with its parsed value. Other content types pass through.
    pub(crate) fn decode_body(&mut self) -> Result<(), AppError> {
        let is_json = self
            .content_type
            .as_deref()
            .is_some_and(is_json_content_type);

        if let (true, RequestBody::Raw(bytes)) = (is_json, &self.body) {
            let value = serde_json::from_slice(bytes).map_err(|err| {
                tracing::warn!(error = ?err, "invalid json request body");
                AppError::bad_request("invalid json body")
            })?;
            self.body = RequestBody::Json(value);
        }
        Ok(())
    }
}

/// `application/json`, optionally with a `charset=utf-8` parameter.
pub fn is_json_content_type(value: &str) -> bool {
    let mut parts = value.split(';').map(str::trim);
    let mime = parts.next().unwrap_or_default();
    if !mime.eq_ignore_ascii_case("application/json") {
        return false;
    }
    parts
        .filter(|p| !p.is_empty())
        .all(|p| p.replace(' ', "").eq_ignore_ascii_case("charset=utf-8"))
}

/// `Authorization`, then `HTTP_AUTHORIZATION` (set by some CGI-style proxies), else empty.
pub fn authorization_from(headers: &HeaderMap) -> String {
    [header::AUTHORIZATION, HTTP_AUTHORIZATION]
        .iter()
        .find_map(|name| headers.get(name).and_then(|v| v.to_str().ok()))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}
