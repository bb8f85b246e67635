//! Configuration: the durable user payload, the per-origin store
//! capability, and the edge daemon's own deployment configuration.

pub mod loader;
pub mod schema;
pub mod store;
pub mod watcher;

pub use loader::{load_edge_config, validate_edge_config};
pub use schema::{CachePolicyConfig, EdgeConfig, GatewayConfig, ObservabilityConfig};
pub use store::{ConfigError, ConfigStore, MemoryConfigStore, OriginStores};
