//! Daemon configuration loading from disk.

use std::path::Path;

use crate::config::schema::EdgeConfig;
use crate::config::store::ConfigError;

/// Load and validate the edge daemon configuration from a TOML file.
pub fn load_edge_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: EdgeConfig = toml::from_str(&content)?;
    validate_edge_config(&config)?;
    Ok(config)
}

/// Reject configurations the daemon cannot run with.
pub fn validate_edge_config(config: &EdgeConfig) -> Result<(), ConfigError> {
    if config.listener.bind_address.is_empty() {
        return Err(ConfigError::Validation(
            "listener.bind_address must not be empty".to_string(),
        ));
    }
    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        return Err(ConfigError::Validation(format!(
            "listener.bind_address is not a socket address: {}",
            config.listener.bind_address
        )));
    }
    if config.upstream.address.is_empty() {
        return Err(ConfigError::Validation(
            "upstream.address must not be empty".to_string(),
        ));
    }
    if !config.cache.worker_asset_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "cache.worker_asset_prefix must start with '/': {}",
            config.cache.worker_asset_prefix
        )));
    }
    if config.cache.asset_ttl_secs == 0 || config.cache.content_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "cache TTLs must be positive; a zero ceiling disables the edge cache".to_string(),
        ));
    }
    Ok(())
}
