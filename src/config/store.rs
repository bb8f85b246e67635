//! Durable per-origin configuration storage.
//!
//! # Responsibilities
//! - Define the storage capability the navigation resolver and the config
//!   sync protocol consume (`get`/`set`/`reset`)
//! - Memoize the one-shot subdomain-support probe result per origin
//!
//! # Design Decisions
//! - Storage is an opaque capability; this crate ships an in-memory
//!   implementation and treats anything durable as the host's concern
//! - Reads and writes are non-atomic; concurrent writers are last-write-wins

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::schema::GatewayConfig;

/// Errors from the durable store or the daemon config loader.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config storage unavailable: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {0}")]
    Validation(String),
}

/// The per-origin durable store capability.
///
/// One instance is scoped to one origin; each isolated subdomain origin
/// has its own storage partition.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// The stored configuration, or `None` when this origin has never been
    /// seeded.
    async fn get(&self) -> Result<Option<GatewayConfig>, ConfigError>;

    /// Persist `config`, replacing any previous value.
    async fn set(&self, config: GatewayConfig) -> Result<(), ConfigError>;

    /// Drop the stored configuration and probe memo.
    async fn reset(&self) -> Result<(), ConfigError>;

    /// Memoized subdomain-support probe result, `None` until the first
    /// probe completes.
    async fn subdomains_supported(&self) -> Result<Option<bool>, ConfigError>;

    /// Record the probe result; cached indefinitely until `reset`.
    async fn set_subdomains_supported(&self, supported: bool) -> Result<(), ConfigError>;
}

#[derive(Debug, Default)]
struct StoreCell {
    config: Option<GatewayConfig>,
    subdomains_supported: Option<bool>,
}

/// In-memory [`ConfigStore`] for one origin.
#[derive(Debug, Default, Clone)]
pub struct MemoryConfigStore {
    cell: Arc<Mutex<StoreCell>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `config`, the shape of a root origin that
    /// already holds user configuration.
    pub fn seeded(config: GatewayConfig) -> Self {
        Self {
            cell: Arc::new(Mutex::new(StoreCell {
                config: Some(config),
                subdomains_supported: None,
            })),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self) -> Result<Option<GatewayConfig>, ConfigError> {
        Ok(self.cell.lock().await.config.clone())
    }

    async fn set(&self, config: GatewayConfig) -> Result<(), ConfigError> {
        self.cell.lock().await.config = Some(config);
        Ok(())
    }

    async fn reset(&self) -> Result<(), ConfigError> {
        let mut cell = self.cell.lock().await;
        cell.config = None;
        cell.subdomains_supported = None;
        Ok(())
    }

    async fn subdomains_supported(&self) -> Result<Option<bool>, ConfigError> {
        Ok(self.cell.lock().await.subdomains_supported)
    }

    async fn set_subdomains_supported(&self, supported: bool) -> Result<(), ConfigError> {
        self.cell.lock().await.subdomains_supported = Some(supported);
        Ok(())
    }
}

/// A map of per-origin stores, mirroring the browser's storage
/// partitioning: every origin sees only its own cell.
#[derive(Debug, Default)]
pub struct OriginStores {
    stores: DashMap<String, MemoryConfigStore>,
}

impl OriginStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store for `origin`, created empty on first access.
    pub fn origin(&self, origin: &str) -> MemoryConfigStore {
        self.stores
            .entry(origin.to_string())
            .or_default()
            .clone()
    }
}
