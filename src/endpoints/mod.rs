/*
 * Responsibility
 * - Bundled endpoint modules and their registration
 * - REST_ENDPOINT_PATH normally points at this directory: each file here is one module
 */
use crate::routing::EndpointRegistry;

pub mod profile;
pub mod status;

/// Conventional REST_NAMESPACE for the bundled modules.
pub const NAMESPACE: &str = "rest_dispatch::endpoints::";

pub fn registry(namespace: &str) -> EndpointRegistry {
    EndpointRegistry::new(namespace)
        .register(status::module())
        .register(profile::module())
}
