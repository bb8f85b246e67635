//! Configuration schema definitions.
//!
//! Two distinct shapes live here: [`GatewayConfig`] is the durable user
//! configuration that travels between origins, and [`EdgeConfig`] is the
//! deployment configuration of the edge redirector daemon, loaded from a
//! TOML file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Durable user configuration.
///
/// The canonical copy lives in per-origin durable storage; a compressed
/// serialized form is the only vehicle for moving it across origins.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Trustless gateway URLs used for block retrieval.
    pub gateways: Vec<String>,

    /// Delegated routing endpoints.
    pub routers: Vec<String>,

    /// DNS-over-HTTPS resolvers keyed by domain suffix; `.` is the
    /// catch-all.
    pub dns_json_resolvers: BTreeMap<String, String>,

    /// Query delegated routers in addition to gateways.
    pub delegated_routing: bool,

    /// Reload content automatically once configuration lands on a
    /// subdomain.
    pub auto_reload: bool,

    /// Debug logging filter; empty disables debug output.
    pub debug: String,

    /// Per-request timeout for content fetches, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateways: vec!["https://trustless-gateway.link".to_string()],
            routers: vec!["https://delegated-ipfs.dev".to_string()],
            dns_json_resolvers: BTreeMap::from([(
                ".".to_string(),
                "https://delegated-ipfs.dev/dns-query".to_string(),
            )]),
            delegated_routing: true,
            auto_reload: false,
            debug: String::new(),
            fetch_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Fill empty collections back in with the defaults, so a config that
    /// partially failed to load still resolves content.
    pub fn or_defaults(mut self) -> Self {
        let defaults = GatewayConfig::default();
        if self.gateways.is_empty() {
            self.gateways = defaults.gateways;
        }
        if self.routers.is_empty() {
            self.routers = defaults.routers;
        }
        if self.dns_json_resolvers.is_empty() {
            self.dns_json_resolvers = defaults.dns_json_resolvers;
        }
        self
    }
}

/// Root configuration for the edge redirector daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Upstream origin the daemon passes unrecognized requests to.
    pub upstream: UpstreamConfig,

    /// Edge cache policy.
    pub cache: CachePolicyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin address requests are passed through to (e.g.,
    /// "127.0.0.1:3000").
    pub address: String,

    /// Total request timeout in seconds.
    pub request_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
            request_secs: 30,
        }
    }
}

/// Edge cache policy knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CachePolicyConfig {
    /// Path prefix of fingerprinted worker assets; identical across every
    /// subdomain, so their cache key is normalized to the bare registrable
    /// domain.
    pub worker_asset_prefix: String,

    /// Edge TTL for worker assets on success, in seconds.
    pub asset_ttl_secs: u64,

    /// Edge TTL for everything else below status 400, in seconds. Bounds
    /// how fast a deny-listed identifier's block stops being served.
    pub content_ttl_secs: u64,
}

impl Default for CachePolicyConfig {
    fn default() -> Self {
        Self {
            worker_asset_prefix: "/gw-sw-".to_string(),
            asset_ttl_secs: 86_400,
            content_ttl_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
