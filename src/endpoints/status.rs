/*
 * Responsibility
 * - GET status/ping (疎通用, no auth)
 */
use serde_json::json;

use crate::dispatch::{RequestInput, RestResponse};
use crate::error::AppError;
use crate::routing::{EndpointModule, HttpMethod, Operation};

pub fn module() -> EndpointModule {
    EndpointModule::new("status")
        .operation(
            Operation::new("ping", ping)
                .method(HttpMethod::Get)
                .url("ping"),
        )
        // Kept callable in-process but never routed.
        .operation(
            Operation::new("reset", reset)
                .method(HttpMethod::Post)
                .url("reset")
                .exclude_from_map(),
        )
}

fn ping(_req: &RequestInput) -> Result<RestResponse, AppError> {
    Ok(RestResponse::ok(json!({
        "status": "ok",
        "time": chrono::Utc::now().to_rfc3339(),
    })))
}

fn reset(_req: &RequestInput) -> Result<RestResponse, AppError> {
    Ok(RestResponse::ok(json!({"reset": true})))
}
