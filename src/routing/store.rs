//! Process-wide route map: loaded from the cache file, or built once when the cache
//! is absent. Concurrent first requests wait on the same build.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::info;

use crate::routing::builder::{BuildError, RouteMapBuilder};
use crate::routing::registry::EndpointRegistry;
use crate::routing::route_map::{CACHE_FILE_NAME, RouteMap};

#[derive(Debug)]
pub struct RouteMapStore {
    registry: Arc<EndpointRegistry>,
    endpoint_dir: PathBuf,
    namespace: String,
    cache_file: PathBuf,
    map: OnceLock<Arc<RouteMap>>,
    build_lock: Mutex<()>,
}

impl RouteMapStore {
    /// Creates the cache directory when missing and requires the endpoint directory
    /// to exist, even if a cache file is already present.
    pub fn new(
        registry: Arc<EndpointRegistry>,
        endpoint_dir: impl Into<PathBuf>,
        namespace: impl Into<String>,
        cache_dir: &Path,
    ) -> Result<Self, BuildError> {
        std::fs::create_dir_all(cache_dir).map_err(|source| BuildError::CacheDir {
            path: cache_dir.to_path_buf(),
            source,
        })?;

        let endpoint_dir = endpoint_dir.into();
        if !endpoint_dir.is_dir() {
            return Err(BuildError::EndpointDirMissing(endpoint_dir));
        }

        Ok(Self {
            registry,
            endpoint_dir,
            namespace: namespace.into(),
            cache_file: cache_dir.join(CACHE_FILE_NAME),
            map: OnceLock::new(),
            build_lock: Mutex::new(()),
        })
    }

    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn get(&self) -> Result<Arc<RouteMap>, BuildError> {
        if let Some(map) = self.map.get() {
            return Ok(Arc::clone(map));
        }

        // Slow path only until the first successful build; readers never lock after that.
        let _guard = self.build_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(map) = self.map.get() {
            return Ok(Arc::clone(map));
        }
        let map = Arc::new(self.load_or_build()?);
        Ok(Arc::clone(self.map.get_or_init(|| map)))
    }

    fn load_or_build(&self) -> Result<RouteMap, BuildError> {
        if self.cache_file.exists() {
            let map = RouteMap::load(&self.cache_file).map_err(|source| BuildError::CacheRead {
                path: self.cache_file.clone(),
                source,
            })?;
            info!(routes = map.len(), file = ?self.cache_file, "route map loaded from cache");
            return Ok(map);
        }

        RouteMapBuilder::new(&self.registry).build_and_persist(
            &self.endpoint_dir,
            &self.namespace,
            &self.cache_file,
        )
    }
}
