pub mod api;
pub mod app;
pub mod config;
pub mod dispatch;
pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod routing;
pub mod services;
pub mod state;
