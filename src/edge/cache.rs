//! Edge cache policy.
//!
//! # Responsibilities
//! - Decide the cache key and TTL for every response the edge serves
//!
//! # Design Decisions
//! - Versioned worker assets are identical across all subdomains, so their
//!   cache key is normalized to the bare registrable domain and one edge
//!   entry serves every origin; errors are never cached for them
//! - Everything else keys per hostname with a short TTL, so deny-listing
//!   an identifier at the origin becomes visible at the edge within
//!   minutes

use std::time::Duration;

use url::Url;

use crate::config::schema::CachePolicyConfig;

/// The cache key and TTL for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDecision {
    /// Key the edge stores the response under.
    pub key: String,
    /// Zero means "do not cache".
    pub ttl: Duration,
}

impl CacheDecision {
    pub fn is_cacheable(&self) -> bool {
        !self.ttl.is_zero()
    }
}

/// Decide caching for a response with `status` to a request for `url`.
pub fn cache_decision(url: &Url, status: u16, policy: &CachePolicyConfig) -> CacheDecision {
    if url.path().starts_with(&policy.worker_asset_prefix) {
        let key = format!(
            "https://{}{}",
            registrable_domain(url.host_str().unwrap_or_default()),
            url.path()
        );
        let ttl = if (200..300).contains(&status) {
            Duration::from_secs(policy.asset_ttl_secs)
        } else {
            Duration::ZERO
        };
        return CacheDecision { key, ttl };
    }

    // default key includes the full hostname, so each subdomain caches
    // independently
    let mut keyed = url.clone();
    keyed.set_fragment(None);
    let ttl = if status < 400 {
        Duration::from_secs(policy.content_ttl_secs)
    } else {
        Duration::ZERO
    };
    CacheDecision {
        key: keyed.to_string(),
        ttl,
    }
}

/// The bare registrable domain: the last two DNS labels, stripping any
/// CID or DNSLink subdomain prefix.
pub fn registrable_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host.to_string();
    }
    labels[labels.len() - 2..].join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CachePolicyConfig {
        CachePolicyConfig::default()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_worker_assets_share_one_key_across_subdomains() {
        let from_root = cache_decision(&url("https://example.com/gw-sw-main.js"), 200, &policy());
        let from_subdomain = cache_decision(
            &url("https://bafkqaaa.ipfs.example.com/gw-sw-main.js"),
            200,
            &policy(),
        );

        assert_eq!(from_root.key, from_subdomain.key);
        assert_eq!(from_root.key, "https://example.com/gw-sw-main.js");
        assert_eq!(from_root.ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn test_worker_asset_errors_are_not_cached() {
        let decision = cache_decision(&url("https://example.com/gw-sw-main.js"), 503, &policy());
        assert!(!decision.is_cacheable());

        let redirect = cache_decision(&url("https://example.com/gw-sw-main.js"), 301, &policy());
        assert!(!redirect.is_cacheable());
    }

    #[test]
    fn test_content_keys_per_hostname() {
        let a = cache_decision(&url("https://bafkqaaa.ipfs.example.com/x"), 200, &policy());
        let b = cache_decision(&url("https://other.ipfs.example.com/x"), 200, &policy());
        assert_ne!(a.key, b.key);
        assert_eq!(a.ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_content_redirects_are_cached_briefly() {
        let decision = cache_decision(&url("https://example.com/ipfs/bafkqaaa"), 301, &policy());
        assert_eq!(decision.ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_content_errors_are_not_cached() {
        let not_found = cache_decision(&url("https://example.com/ipfs/bafkqaaa"), 404, &policy());
        assert!(!not_found.is_cacheable());

        let gone = cache_decision(&url("https://bad.ipfs.example.com/"), 410, &policy());
        assert!(!gone.is_cacheable());
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("example.com"), "example.com");
        assert_eq!(
            registrable_domain("bafkqaaa.ipfs.example.com"),
            "example.com"
        );
        assert_eq!(registrable_domain("localhost"), "localhost");
    }
}
