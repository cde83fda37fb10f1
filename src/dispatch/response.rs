//! JSON envelope returned by every endpoint and by the error boundary.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl RestResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(content: impl Into<Value>) -> Self {
        Self {
            success: true,
            debug: None,
            content: Some(content.into()),
        }
    }

    pub fn failure(message: impl Into<String>, code: u16) -> Self {
        Self {
            success: false,
            debug: None,
            content: Some(json!({
                "message": message.into(),
                "code": code.to_string(),
            })),
        }
    }

    pub fn with_debug(mut self, message: impl Into<String>) -> Self {
        self.debug = Some(message.into());
        self
    }
}

impl IntoResponse for RestResponse {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self) {
            Ok(body) => (
                [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8))],
                body,
            )
                .into_response(),
            Err(err) => {
                tracing::error!(error = ?err, "failed to serialize response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
