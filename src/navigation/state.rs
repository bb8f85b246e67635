//! Per-navigation state capture.

use url::Url;

use crate::config::store::ConfigStore;
use crate::gateway::params::{
    is_ui_page_request, SearchParams, CONFIG_PARAM, CONFIG_REQUEST_PARAM, REDIRECT_PARAM,
};
use crate::gateway::request::{is_path_or_subdomain_request, subdomain_parts};
use crate::navigation::probe::{check_subdomain_support, SubdomainProbe};

/// Everything the resolver needs to know about one navigation.
///
/// Computed fresh per navigation and never persisted: constructed once at
/// page load from the current URL plus two async probes, consumed
/// immediately by the resolver, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    /// Durable config already present at this origin.
    pub has_config: bool,

    /// The current origin is an isolated `<id>.ip[fn]s.` subdomain.
    pub is_isolated_origin: bool,

    /// The URL carries the subdomain config request marker.
    pub url_has_subdomain_config_request: bool,

    /// Probe answer; `None` when the navigation never needed to ask.
    pub supports_subdomains: Option<bool>,

    /// Compressed config payload found in the URL, if any.
    pub compressed_config: Option<String>,

    /// The URL names content-addressed data (by path, subdomain, or the
    /// pending-path parameter).
    pub request_for_content_addressed_data: bool,
}

impl NavigationState {
    /// Capture the state for `location`.
    ///
    /// Runs the durable-config check always and the subdomain-support
    /// probe only when the decision could need it (path-form requests).
    pub async fn capture(
        location: &Url,
        store: &dyn ConfigStore,
        probe: &dyn SubdomainProbe,
    ) -> Self {
        let params = SearchParams::from_url(location);
        let is_isolated_origin = subdomain_parts(location).is_some();

        let has_config = match store.get().await {
            Ok(config) => config.is_some(),
            Err(err) => {
                tracing::warn!(error = %err, "durable config check failed, assuming absent");
                false
            }
        };

        let is_path_request = !is_isolated_origin && is_path_or_subdomain_request(location);
        let supports_subdomains = if is_isolated_origin {
            Some(true)
        } else if is_path_request {
            Some(check_subdomain_support(location, store, probe).await)
        } else {
            None
        };

        Self {
            has_config,
            is_isolated_origin,
            url_has_subdomain_config_request: params.contains(CONFIG_REQUEST_PARAM),
            supports_subdomains,
            compressed_config: params.get(CONFIG_PARAM).map(String::from),
            request_for_content_addressed_data: request_for_content_addressed_data(location),
        }
    }
}

/// Whether `location` asks for content-addressed data rather than the
/// gateway's own UI.
pub fn request_for_content_addressed_data(location: &Url) -> bool {
    if is_ui_page_request(location) {
        return false;
    }
    if is_path_or_subdomain_request(location) {
        return true;
    }
    SearchParams::from_url(location).contains(REDIRECT_PARAM)
}
