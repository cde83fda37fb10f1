//! Route map construction from the endpoint directory.
//!
//! The directory lists which endpoint modules are deployed: every `*.rs` file whose
//! base name resolves to a registered module contributes that module's public,
//! non-excluded operations.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::routing::endpoint::HttpMethod;
use crate::routing::registry::EndpointRegistry;
use crate::routing::route_map::RouteMap;

pub const MODULE_EXTENSION: &str = "rs";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("endpoint directory {0:?} does not exist")]
    EndpointDirMissing(PathBuf),
    #[error("failed to read endpoint directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache directory {path:?} could not be created: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("route cache {path:?} is unreadable: {source}")]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("duplicate route {method} {path}: {first} and {second}")]
    DuplicateRoute {
        method: HttpMethod,
        path: String,
        first: String,
        second: String,
    },
}

pub struct RouteMapBuilder<'a> {
    registry: &'a EndpointRegistry,
}

impl<'a> RouteMapBuilder<'a> {
    pub fn new(registry: &'a EndpointRegistry) -> Self {
        Self { registry }
    }

    pub fn build(&self, endpoint_dir: &Path, namespace: &str) -> Result<RouteMap, BuildError> {
        if !endpoint_dir.is_dir() {
            return Err(BuildError::EndpointDirMissing(endpoint_dir.to_path_buf()));
        }

        let mut files = Vec::new();
        collect_module_files(endpoint_dir, &mut files)?;
        files.sort();

        let mut map = RouteMap::new();
        for file in &files {
            let Some(module_name) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let qualified = format!("{namespace}{module_name}");
            let Some(module) = self.registry.module(&qualified) else {
                debug!(module = %qualified, file = ?file, "no endpoint module registered");
                continue;
            };

            for endpoint in module.endpoints(module_name) {
                if endpoint.excluded {
                    continue;
                }
                let target = endpoint.target();
                if let Some(previous) =
                    map.insert(endpoint.http_method, endpoint.url_path.clone(), target.clone())
                {
                    if previous != target {
                        return Err(BuildError::DuplicateRoute {
                            method: endpoint.http_method,
                            path: endpoint.url_path,
                            first: previous,
                            second: target,
                        });
                    }
                }
            }
        }

        info!(
            routes = map.len(),
            files = files.len(),
            dir = ?endpoint_dir,
            "route map built"
        );
        Ok(map)
    }

    /// Builds, then writes the cache file when the map is non-empty. A failed write is
    /// only logged.
    pub fn build_and_persist(
        &self,
        endpoint_dir: &Path,
        namespace: &str,
        cache_file: &Path,
    ) -> Result<RouteMap, BuildError> {
        let map = self.build(endpoint_dir, namespace)?;
        if !map.is_empty() {
            if let Err(err) = map.persist(cache_file) {
                warn!(error = ?err, file = ?cache_file, "failed to write route cache");
            }
        }
        Ok(map)
    }
}

fn collect_module_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), BuildError> {
    let read_err = |source| BuildError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_dir() {
            collect_module_files(&path, out)?;
        } else if path.extension().is_some_and(|e| e == MODULE_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{request::RequestInput, response::RestResponse};
    use crate::error::AppError;
    use crate::routing::registry::{EndpointModule, Operation};
    use std::fs;

    const NS: &str = "app::endpoints::";

    fn noop(_: &RequestInput) -> Result<RestResponse, AppError> {
        Ok(RestResponse::new())
    }

    fn registry() -> EndpointRegistry {
        EndpointRegistry::new(NS)
            .register(
                EndpointModule::new("Users")
                    .operation(Operation::new("list", noop).method(HttpMethod::Get).url("list"))
                    .operation(
                        Operation::new("create", noop)
                            .method(HttpMethod::Post)
                            .url("create")
                            .auth(true),
                    )
                    .operation(
                        Operation::new("purge", noop)
                            .method(HttpMethod::Delete)
                            .url("purge")
                            .exclude_from_map(),
                    )
                    .operation(Operation::new("helper", noop).method(HttpMethod::Get))
                    .operation(
                        Operation::new("audit", noop)
                            .method(HttpMethod::Get)
                            .url("audit")
                            .internal(),
                    ),
            )
            .register(
                EndpointModule::new("status")
                    .operation(Operation::new("ping", noop).method(HttpMethod::Get).url("ping")),
            )
    }

    fn endpoint_dir(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            let path = dir.path().join(f);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        dir
    }

    #[test]
    fn contains_exactly_public_declared_non_excluded_operations() {
        let dir = endpoint_dir(&["Users.rs", "nested/status.rs", "notes.txt", "Unknown.rs"]);
        let registry = registry();
        let map = RouteMapBuilder::new(&registry).build(dir.path(), NS).unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(map.lookup(HttpMethod::Get, "users/list"), Some("list@Users"));
        assert_eq!(map.lookup(HttpMethod::Post, "users/create"), Some("create@Users"));
        assert_eq!(map.lookup(HttpMethod::Get, "status/ping"), Some("ping@status"));
        assert_eq!(map.lookup(HttpMethod::Delete, "users/purge"), None);
        assert_eq!(map.lookup(HttpMethod::Get, "users/audit"), None);
    }

    #[test]
    fn only_deployed_modules_are_mapped() {
        let dir = endpoint_dir(&["status.rs"]);
        let registry = registry();
        let map = RouteMapBuilder::new(&registry).build(dir.path(), NS).unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn wrong_namespace_resolves_nothing() {
        let dir = endpoint_dir(&["Users.rs"]);
        let registry = registry();
        let map = RouteMapBuilder::new(&registry)
            .build(dir.path(), "other::")
            .unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let registry = registry();
        let err = RouteMapBuilder::new(&registry)
            .build(Path::new("/nonexistent/endpoints"), NS)
            .unwrap_err();
        assert!(matches!(err, BuildError::EndpointDirMissing(_)));
    }

    #[test]
    fn conflicting_declarations_fail_the_build() {
        let registry = EndpointRegistry::new(NS).register(
            EndpointModule::new("dup")
                .operation(Operation::new("a", noop).method(HttpMethod::Get).url("x"))
                .operation(Operation::new("b", noop).method(HttpMethod::Get).url("x")),
        );
        let dir = endpoint_dir(&["dup.rs"]);
        let err = RouteMapBuilder::new(&registry).build(dir.path(), NS).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateRoute { .. }));
    }

    #[test]
    fn same_module_in_two_directories_is_not_a_conflict() {
        let dir = endpoint_dir(&["a/status.rs", "b/status.rs"]);
        let registry = registry();
        let map = RouteMapBuilder::new(&registry).build(dir.path(), NS).unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn persists_non_empty_maps_only() {
        let registry = registry();
        let cache = tempfile::tempdir().unwrap();
        let cache_file = cache.path().join("map.cache");

        let empty = endpoint_dir(&[]);
        RouteMapBuilder::new(&registry)
            .build_and_persist(empty.path(), NS, &cache_file)
            .unwrap();
        assert!(!cache_file.exists());

        let dir = endpoint_dir(&["status.rs"]);
        let built = RouteMapBuilder::new(&registry)
            .build_and_persist(dir.path(), NS, &cache_file)
            .unwrap();
        assert_eq!(RouteMap::load(&cache_file).unwrap(), built);
    }

    #[test]
    fn unwritable_cache_does_not_fail_the_build() {
        let registry = registry();
        let dir = endpoint_dir(&["status.rs"]);
        let map = RouteMapBuilder::new(&registry)
            .build_and_persist(dir.path(), NS, Path::new("/nonexistent/dir/map.cache"))
            .unwrap();
        assert_eq!(map.len(), 1);
    }
}
