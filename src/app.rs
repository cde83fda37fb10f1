/*
 * Responsibility
 * - Config読み込み → 依存生成 (registry / route map / token validator) → Router 組み立て
 * - Middleware の適用 (HTTP / CORS)
 * - axum::serve() で起動
 */
use std::panic;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::endpoints;
use crate::middleware::{self, bearer_auth::AuthGate};
use crate::routing::RouteMapStore;
use crate::services::auth::build_token_validator;
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,rest_dispatch=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook() {
    let default_hook = panic::take_hook();

    // Handler panics are caught by the dispatcher; this only makes them visible in the log.
    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");
        default_hook(info);
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook();

    tracing::info!(
        "starting rest dispatcher in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wires the registry, route map and token validator into a dispatcher and builds
/// the route map once before the listener opens.
pub fn build_state(config: &Config) -> Result<AppState> {
    let registry = Arc::new(endpoints::registry(&config.namespace));
    let store = RouteMapStore::new(
        registry,
        config.endpoint_path.clone(),
        config.namespace.clone(),
        &config.cache_path,
    )
    .context("route map store")?;

    let gate = AuthGate::new(build_token_validator(config));
    let dispatcher = Dispatcher::new(store, gate, &config.namespace, &config.path_prefix);

    let routes = dispatcher.warm_up().context("route map build")?;
    tracing::info!(routes = routes.len(), "route map ready");

    Ok(AppState::new(Arc::new(dispatcher)))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new().fallback(api::rest::entry).with_state(state);
    let router = middleware::http::apply(router);
    middleware::cors::apply(router, config)
}
