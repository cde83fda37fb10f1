//! Explicit endpoint registration.
//!
//! Every endpoint module registers its operations here at program start: a typed
//! handler plus the declarations (method, url suffix, auth, exclusion) the route map
//! builder and the dispatcher read back. Modules are keyed by their fully qualified
//! name (`namespace + module`).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::{request::RequestInput, response::RestResponse};
use crate::error::AppError;
use crate::routing::endpoint::{EndpointMeta, HttpMethod, Visibility};

pub type Handler = Arc<dyn Fn(&RequestInput) -> Result<RestResponse, AppError> + Send + Sync>;

/// Declarations attached to one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationAttrs {
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub auth: bool,
    pub excluded: bool,
    pub visibility: Visibility,
}

#[derive(Clone)]
pub struct Operation {
    symbol: String,
    attrs: OperationAttrs,
    handler: Handler,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("symbol", &self.symbol)
            .field("attrs", &self.attrs)
            .finish()
    }
}

impl Operation {
    pub fn new<F>(symbol: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&RequestInput) -> Result<RestResponse, AppError> + Send + Sync + 'static,
    {
        Self {
            symbol: symbol.into(),
            attrs: OperationAttrs::default(),
            handler: Arc::new(handler),
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.attrs.method = Some(method);
        self
    }

    pub fn url(mut self, suffix: impl Into<String>) -> Self {
        self.attrs.url = Some(suffix.into());
        self
    }

    pub fn auth(mut self, required: bool) -> Self {
        self.attrs.auth = required;
        self
    }

    pub fn exclude_from_map(mut self) -> Self {
        self.attrs.excluded = true;
        self
    }

    pub fn internal(mut self) -> Self {
        self.attrs.visibility = Visibility::Internal;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_public(&self) -> bool {
        self.attrs.visibility == Visibility::Public
    }

    pub fn auth_required(&self) -> bool {
        self.attrs.auth
    }

    pub fn call(&self, req: &RequestInput) -> Result<RestResponse, AppError> {
        (self.handler)(req)
    }
}

#[derive(Debug, Clone)]
pub struct EndpointModule {
    name: String,
    operations: Vec<Operation>,
}

impl EndpointModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    pub fn operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find(&self, symbol: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.symbol == symbol)
    }

    pub fn public_operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| op.is_public())
    }

    /// Public operations turned into endpoint metadata, in declaration order.
    ///
    /// `module_name` is the identifier the module was discovered under; it drives the
    /// url prefix and the target reference.
    pub fn endpoints(&self, module_name: &str) -> Vec<EndpointMeta> {
        self.public_operations()
            .filter_map(|op| {
                let method = op.attrs.method?;
                let suffix = op.attrs.url.as_deref().filter(|s| !s.is_empty())?;
                Some(EndpointMeta {
                    http_method: method,
                    url_path: EndpointMeta::url_path_for(module_name, suffix),
                    module_name: module_name.to_string(),
                    symbol_name: op.symbol.clone(),
                    auth_required: op.attrs.auth,
                    excluded: op.attrs.excluded,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    namespace: String,
    modules: HashMap<String, EndpointModule>,
}

impl EndpointRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            modules: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Registers under `namespace + module.name()`; a later registration replaces an
    /// earlier one with the same name.
    pub fn register(mut self, module: EndpointModule) -> Self {
        let key = format!("{}{}", self.namespace, module.name());
        self.modules.insert(key, module);
        self
    }

    pub fn module(&self, qualified_name: &str) -> Option<&EndpointModule> {
        self.modules.get(qualified_name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &RequestInput) -> Result<RestResponse, AppError> {
        Ok(RestResponse::new())
    }

    #[test]
    fn endpoints_skip_internal_and_undeclared_operations() {
        let module = EndpointModule::new("Users")
            .operation(Operation::new("list", noop).method(HttpMethod::Get).url("list"))
            .operation(Operation::new("no_url", noop).method(HttpMethod::Get))
            .operation(Operation::new("empty_url", noop).method(HttpMethod::Get).url(""))
            .operation(Operation::new("no_method", noop).url("x"))
            .operation(
                Operation::new("hidden", noop)
                    .method(HttpMethod::Get)
                    .url("hidden")
                    .internal(),
            );

        let endpoints = module.endpoints("Users");
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].url_path, "users/list");
        assert_eq!(endpoints[0].target(), "list@Users");
    }

    #[test]
    fn modules_are_keyed_by_qualified_name() {
        let registry = EndpointRegistry::new("app::endpoints::")
            .register(EndpointModule::new("status").operation(Operation::new("ping", noop)));

        assert!(registry.module("app::endpoints::status").is_some());
        assert!(registry.module("status").is_none());
        assert!(
            registry
                .module("app::endpoints::status")
                .and_then(|m| m.find("ping"))
                .is_some()
        );
    }
}
