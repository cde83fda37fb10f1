//! Request pipeline: normalize → route lookup → auth gate → handler → reply.
//!
//! `dispatch` is the single error boundary. Nothing below it reaches the transport as
//! a fault; every failure becomes a JSON reply with a status.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, warn};

use crate::dispatch::request::{InvocationContext, RequestInput};
use crate::dispatch::response::RestResponse;
use crate::error::AppError;
use crate::middleware::bearer_auth::AuthGate;
use crate::routing::{BuildError, HttpMethod, RouteMap, RouteMapStore, TargetDescriptor, normalize};

#[derive(Debug)]
pub enum Outcome {
    /// `OPTIONS`: nothing beyond the CORS headers is sent.
    Preflight,
    Served(RestResponse),
}

/// What the transport sends back.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Option<RestResponse>,
}

impl Reply {
    pub fn from_error(err: &AppError) -> Self {
        Self {
            status: err.status_code(),
            body: Some(err.to_rest_response()),
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, body).into_response(),
            None => self.status.into_response(),
        }
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    routes: RouteMapStore,
    gate: AuthGate,
    namespace: String,
    path_prefix: String,
}

impl Dispatcher {
    pub fn new(
        routes: RouteMapStore,
        gate: AuthGate,
        namespace: impl Into<String>,
        path_prefix: impl Into<String>,
    ) -> Self {
        Self {
            routes,
            gate,
            namespace: namespace.into(),
            path_prefix: path_prefix.into(),
        }
    }

    /// Loads or builds the route map ahead of the first request.
    pub fn warm_up(&self) -> Result<Arc<RouteMap>, BuildError> {
        self.routes.get()
    }

    pub fn dispatch(&self, req: RequestInput) -> Reply {
        let method = req.method.clone();
        let uri = req.uri.clone();

        let result = catch_unwind(AssertUnwindSafe(|| self.handle(req)))
            .unwrap_or_else(|_| {
                error!(%method, %uri, "handler panicked");
                Err(AppError::Internal)
            });

        match result {
            Ok(Outcome::Preflight) => Reply {
                status: StatusCode::OK,
                body: None,
            },
            Ok(Outcome::Served(body)) => Reply {
                status: StatusCode::OK,
                body: Some(body),
            },
            Err(err) => {
                let status_line = err.status_line();
                if err.status_code().is_server_error() {
                    error!(error = ?err, %method, %uri, status = %status_line, "request failed");
                } else {
                    warn!(error = %err, %method, %uri, status = %status_line, "request rejected");
                }
                Reply::from_error(&err)
            }
        }
    }

    pub fn handle(&self, mut req: RequestInput) -> Result<Outcome, AppError> {
        if req.context != InvocationContext::Http {
            return Err(AppError::Forbidden);
        }
        if req.method == HttpMethod::Options.as_str() {
            return Ok(Outcome::Preflight);
        }
        req.decode_body()?;

        let path = normalize(&req.uri, &self.path_prefix);
        let method: HttpMethod = req.method.parse().map_err(|_| AppError::NotFound)?;

        let routes = self.routes.get().map_err(|err| {
            error!(error = %err, "route map unavailable");
            AppError::Internal
        })?;
        let target = routes
            .lookup(method, &path)
            .and_then(TargetDescriptor::parse)
            .ok_or(AppError::NotFound)?;

        // Auth is read from the registry on every request, not from the cached map.
        let qualified = format!("{}{}", self.namespace, target.module);
        let operation = self
            .routes
            .registry()
            .module(&qualified)
            .and_then(|module| module.find(&target.symbol));

        if let Some(op) = operation {
            req.claims = self.gate.check(op, &req.authorization)?;
        }

        let op = operation.filter(|op| op.is_public()).ok_or_else(|| {
            error!(module = %qualified, symbol = %target.symbol, "route target is not callable");
            AppError::Internal
        })?;

        debug!(%method, %path, module = %qualified, symbol = op.symbol(), "dispatching");
        op.call(&req).map(Outcome::Served)
    }
}
