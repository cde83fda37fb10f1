//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     endpoints::registry()          (typed handlers + declarations)
//!     → builder.rs (scan endpoint dir, resolve modules, filter operations)
//!     → route_map.rs (persisted to rest-service-map.cache)
//!
//! Per request:
//!     raw path → normalize.rs → RouteMap::lookup → TargetDescriptor
//! ```
//!
//! The route map is fixed for the lifetime of the process; delete the cache file
//! to have it rebuilt on the next start.

pub mod builder;
pub mod endpoint;
pub mod normalize;
pub mod registry;
pub mod route_map;
pub mod store;

pub use builder::{BuildError, RouteMapBuilder};
pub use endpoint::{EndpointMeta, HttpMethod, Visibility};
pub use normalize::normalize;
pub use registry::{EndpointModule, EndpointRegistry, Handler, Operation};
pub use route_map::{RouteMap, TargetDescriptor};
pub use store::RouteMapStore;
