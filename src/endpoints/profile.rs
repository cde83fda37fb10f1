/*
 * Responsibility
 * - profile routes (bearer token required)
 * - Handlers read the verified claims and the decoded body from the request themselves
 */
use serde_json::{Value, json};

use crate::dispatch::{RequestInput, RestResponse};
use crate::error::AppError;
use crate::routing::{EndpointModule, HttpMethod, Operation};

pub fn module() -> EndpointModule {
    EndpointModule::new("profile")
        .operation(
            Operation::new("me", me)
                .method(HttpMethod::Get)
                .url("me")
                .auth(true),
        )
        .operation(
            Operation::new("echo", echo)
                .method(HttpMethod::Post)
                .url("echo")
                .auth(true),
        )
        .operation(
            Operation::new("audit", audit)
                .method(HttpMethod::Get)
                .url("audit")
                .internal(),
        )
}

fn me(req: &RequestInput) -> Result<RestResponse, AppError> {
    let claims = req.claims().ok_or(AppError::Forbidden)?;
    Ok(RestResponse::ok(json!({
        "sub": claims.subject(),
        "iss": claims.issuer(),
    })))
}

fn echo(req: &RequestInput) -> Result<RestResponse, AppError> {
    let body = req
        .json()
        .cloned()
        .ok_or_else(|| AppError::bad_request("expected a json body"))?;
    Ok(RestResponse::ok(json!({ "echo": body })))
}

fn audit(req: &RequestInput) -> Result<RestResponse, AppError> {
    let sub = req
        .claims()
        .and_then(|c| c.subject())
        .map(|s| Value::String(s.to_string()))
        .unwrap_or(Value::Null);
    Ok(RestResponse::ok(json!({ "audited": sub })))
}
