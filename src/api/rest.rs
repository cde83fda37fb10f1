use axum::body::Bytes;
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};

use crate::dispatch::{Reply, RequestInput};
use crate::error::AppError;
use crate::state::AppState;

/// Fallback handler that feeds every request into the dispatcher.
///
/// Dispatch does blocking file IO (route map, key file) and runs user handlers,
/// so it is moved off the async workers.
pub async fn entry(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let req = RequestInput::from_http(&method, &uri, &headers, body);
    let dispatcher = state.dispatcher.clone();

    let reply = tokio::task::spawn_blocking(move || dispatcher.dispatch(req))
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "dispatch task failed");
            Reply::from_error(&AppError::Internal)
        });

    reply.into_response()
}
