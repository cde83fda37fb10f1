/*
 * Responsibility
 * - Dispatch boundary error kinds (AppError)
 * - HTTP status / reason phrase mapping
 * - IntoResponse: errors become the same JSON envelope handlers return
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::dispatch::response::RestResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { message: String },
    #[error("Forbidden")]
    Forbidden,
    #[error("invalid rest-service target")]
    NotFound,
    #[error("Internal Server Error")]
    Internal,
    /// Raised by handlers that want a specific status.
    #[error("{message}")]
    Status { status: StatusCode, message: String },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Status { status, .. } => *status,
        }
    }

    /// `{code} {reason}` as sent on the status line.
    pub fn status_line(&self) -> String {
        let status = self.status_code();
        format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )
    }

    /// `success=false`, `content={message, code}`.
    pub fn to_rest_response(&self) -> RestResponse {
        RestResponse::failure(self.to_string(), self.status_code().as_u16())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, self.to_rest_response()).into_response()
    }
}
