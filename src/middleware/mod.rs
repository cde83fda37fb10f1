/*
 * Responsibility
 * - middleware の公開インターフェース
 * - http: request-id / trace / limit / timeout, cors: browser origin policy
 * - bearer_auth: per-operation token gate used by the dispatcher
 */
pub mod bearer_auth;
pub mod cors;
pub mod http;
