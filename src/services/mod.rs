/*
 * Responsibility
 * - Request-independent services shared through AppState
 */
pub mod auth;
