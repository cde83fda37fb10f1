//! Route map: `method -> normalized path -> "symbol@module"`.
//!
//! Serialized as-is to the cache artifact, e.g.
//! `{"GET":{"status/ping":"ping@status"}}`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::routing::endpoint::HttpMethod;

pub const CACHE_FILE_NAME: &str = "rest-service-map.cache";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteMap {
    routes: BTreeMap<HttpMethod, BTreeMap<String, String>>,
}

impl RouteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the target previously stored for the same key, if any.
    pub fn insert(
        &mut self,
        method: HttpMethod,
        path: impl Into<String>,
        target: impl Into<String>,
    ) -> Option<String> {
        self.routes
            .entry(method)
            .or_default()
            .insert(path.into(), target.into())
    }

    pub fn lookup(&self, method: HttpMethod, path: &str) -> Option<&str> {
        self.routes
            .get(&method)
            .and_then(|paths| paths.get(path))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (HttpMethod, &str, &str)> {
        self.routes.iter().flat_map(|(method, paths)| {
            paths
                .iter()
                .map(move |(path, target)| (*method, path.as_str(), target.as_str()))
        })
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(io::Error::from)
    }

    pub fn persist(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_vec(self).map_err(io::Error::from)?;
        fs::write(path, json)
    }
}

/// `(symbol, module)` resolved from a stored `symbol@module` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub symbol: String,
    pub module: String,
}

impl TargetDescriptor {
    /// `None` unless the reference contains exactly one `@`.
    pub fn parse(target: &str) -> Option<Self> {
        let mut parts = target.split('@');
        let symbol = parts.next()?;
        let module = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            symbol: symbol.to_string(),
            module: module.to_string(),
        })
    }
}
