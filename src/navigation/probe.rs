//! Subdomain-support probe.
//!
//! # Responsibilities
//! - Determine whether the deployment supports wildcard subdomains by
//!   loading a known 1x1 image from a synthetic subdomain URL
//! - Memoize the answer per origin; the probe costs a real network round
//!   trip and must run at most once
//!
//! # Design Decisions
//! - Probe failure means "unsupported", never an unresolved state; the
//!   resolver always gets a usable answer
//! - The probe subdomain uses the empty inline CID, so a supporting
//!   deployment can serve it without fetching anything

use async_trait::async_trait;
use axum::body::Body;
use hyper::Request;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use url::Url;

use crate::config::store::ConfigStore;
use crate::gateway::request::subdomain_parts;
use crate::navigation::NavigationError;

/// The empty inline (identity) CID the probe subdomain is built from.
pub const PROBE_CID: &str = "bafkqaaa";

/// The 1x1 image asset the probe requests.
pub const PROBE_ASSET: &str = "gw-sw-1x1.png";

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers "does this deployment resolve wildcard subdomains?".
#[async_trait]
pub trait SubdomainProbe: Send + Sync {
    async fn probe(&self, location: &Url) -> Result<bool, NavigationError>;
}

/// Build the probe URL for a location:
/// `{scheme}://bafkqaaa.ipfs.{host}/{asset}`.
pub fn probe_url(location: &Url) -> Option<Url> {
    let host = location.host_str()?;
    let host = match location.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let url = format!(
        "{}://{PROBE_CID}.ipfs.{host}/{PROBE_ASSET}",
        location.scheme()
    );
    Url::parse(&url).ok()
}

/// Probes by fetching the 1x1 image over HTTP; a successful load means
/// subdomains resolve.
pub struct HttpImageProbe {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HttpImageProbe {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            timeout: PROBE_TIMEOUT,
        }
    }
}

impl Default for HttpImageProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubdomainProbe for HttpImageProbe {
    async fn probe(&self, location: &Url) -> Result<bool, NavigationError> {
        let Some(url) = probe_url(location) else {
            return Ok(false);
        };

        let request = Request::builder()
            .method("GET")
            .uri(url.as_str())
            .header("user-agent", "subdomain-gateway-probe")
            .body(Body::empty())
            .map_err(|e| NavigationError::Probe(e.to_string()))?;

        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response.status().is_success()),
            Ok(Err(err)) => Err(NavigationError::Probe(err.to_string())),
            Err(_) => Err(NavigationError::Probe("probe timed out".to_string())),
        }
    }
}

/// The memoized subdomain-support answer for `location`'s origin.
///
/// Already-isolated origins are trivially supported; otherwise the cached
/// result is returned, and only a cache miss runs the real probe. Probe
/// errors are logged and recorded as "unsupported".
pub async fn check_subdomain_support(
    location: &Url,
    store: &dyn ConfigStore,
    probe: &dyn SubdomainProbe,
) -> bool {
    if subdomain_parts(location).is_some() {
        return true;
    }

    match store.subdomains_supported().await {
        Ok(Some(cached)) => return cached,
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(error = %err, "probe memo unavailable, probing again");
        }
    }

    let supported = match probe.probe(location).await {
        Ok(supported) => supported,
        Err(err) => {
            tracing::warn!(error = %err, "subdomain probe failed, treating as unsupported");
            false
        }
    };

    if let Err(err) = store.set_subdomains_supported(supported).await {
        tracing::warn!(error = %err, "failed to memoize probe result");
    }
    supported
}
