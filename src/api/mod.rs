/*
 * Responsibility
 * - HTTP 入口 (axum handler → Dispatcher)
 * - There is no static route table: every request goes through the fallback
 */
pub mod rest;
