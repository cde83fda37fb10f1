//! Endpoint metadata model.
//!
//! One `EndpointMeta` describes one discoverable operation: which HTTP method and
//! URL it answers, which module/symbol implements it, and whether a bearer token
//! is required before it runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of HTTP methods an operation can be declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
    Trace,
    Connect,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 9] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Options,
        Self::Patch,
        Self::Trace,
        Self::Connect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
            Self::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported http method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    // Exact match only: request methods are case-sensitive tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// Whether an operation can be reached from outside its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Internal,
}

/// Metadata of one discovered public operation, ready to be placed in a route map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointMeta {
    pub http_method: HttpMethod,
    /// `lowercase(module_name) + "/" + declared suffix`
    pub url_path: String,
    pub module_name: String,
    pub symbol_name: String,
    pub auth_required: bool,
    pub excluded: bool,
}

impl EndpointMeta {
    pub fn url_path_for(module_name: &str, suffix: &str) -> String {
        format!("{}/{}", module_name.to_lowercase(), suffix)
    }

    /// Route map target reference: `symbol@module`.
    pub fn target(&self) -> String {
        format!("{}@{}", self.symbol_name, self.module_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_declared_method() {
        for m in HttpMethod::ALL {
            assert_eq!(m.as_str().parse::<HttpMethod>(), Ok(m));
        }
        assert!("get".parse::<HttpMethod>().is_err());
        assert!("BREW".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn url_path_lowercases_module_only() {
        assert_eq!(EndpointMeta::url_path_for("Users", "ById"), "users/ById");
    }

    #[test]
    fn method_serializes_uppercase() {
        let json = serde_json::to_string(&HttpMethod::Patch).unwrap();
        assert_eq!(json, "\"PATCH\"");
    }
}
