//! First-hit navigation resolver.
//!
//! # Responsibilities
//! - Decide, once per page load, what a navigation should do next:
//!   render, redirect, or move configuration across the origin boundary
//! - Build the pending-path redirect URLs and translate them back
//!
//! # Design Decisions
//! - A single-shot decision function over explicit state, not a long-lived
//!   object; conditions are checked in a fixed order and the first match
//!   wins
//! - Every rewrite preserves foreign query parameters and the fragment;
//!   deep links with query strings must survive the multi-hop redirect
//!   dance

use url::Url;

use crate::config::schema::GatewayConfig;
use crate::gateway::params::{
    decode_component, SearchParams, CONFIG_PARAM, CONFIG_REQUEST_PARAM, REDIRECT_PARAM,
    TARGET_PARAM,
};
use crate::gateway::request::GatewayRequest;
use crate::gateway::translate::{gateway_root, to_subdomain_url};
use crate::navigation::state::NavigationState;
use crate::sync::bus::SyncError;
use crate::sync::compress::compress_config;

/// What a navigation should do next. One action per page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Not a content request: render the application UI and stop.
    RenderUi,

    /// Isolated origin with config already present: render content.
    RenderContent,

    /// Path-form request on a deployment with subdomain support: replace
    /// the navigation with the canonical isolated origin.
    RedirectToSubdomain(Url),

    /// Path-form request without subdomain support: rewrite to the origin
    /// root with the original path stashed in the pending-path parameter,
    /// so the worker registers at root scope.
    RedirectToRootScope(Url),

    /// Isolated origin without config: go ask the root origin for it.
    RequestConfigFromRoot(Url),

    /// Root origin was asked for config: compress it and redirect back.
    ServeConfigToSubdomain { reply_to: Url },

    /// Compressed config rides in the URL: persist it, strip the
    /// parameter, register the worker, then navigate to `next`.
    ApplyConfigFromUrl { compressed: String, next: Url },

    /// Register the worker and navigate to the final URL.
    RegisterAndNavigate(Url),
}

/// Decide the next action for one navigation.
pub fn resolve(location: &Url, state: &NavigationState) -> Resolution {
    // not a content request, nothing riding in the URL: plain UI
    if !state.request_for_content_addressed_data
        && state.compressed_config.is_none()
        && !state.url_has_subdomain_config_request
    {
        return Resolution::RenderUi;
    }

    // isolated origin that is already configured
    if state.is_isolated_origin && state.has_config {
        return Resolution::RenderContent;
    }

    let is_path_request =
        !state.is_isolated_origin && GatewayRequest::from_path_url(location).is_some();

    if is_path_request {
        if state.supports_subdomains == Some(true) {
            if let Some(redirect) = to_subdomain_url(location) {
                let mut target = redirect.location;
                target.set_fragment(location.fragment());
                return Resolution::RedirectToSubdomain(target);
            }
            // identifier failed to decode; park at the root and let the
            // worker produce the error response
        }
        return Resolution::RedirectToRootScope(pending_redirect_url(location, None));
    }

    // isolated origin with no config and nothing in flight yet
    if state.is_isolated_origin
        && !state.has_config
        && !state.url_has_subdomain_config_request
        && state.compressed_config.is_none()
    {
        return Resolution::RequestConfigFromRoot(config_request_url(location));
    }

    // root origin being asked for its config
    if !state.is_isolated_origin && state.url_has_subdomain_config_request {
        let reply_to = SearchParams::from_url(location)
            .get(TARGET_PARAM)
            .and_then(|target| Url::parse(target).ok());
        if let Some(reply_to) = reply_to {
            return Resolution::ServeConfigToSubdomain { reply_to };
        }
        // marker without a reply target is not actionable
        return Resolution::RenderUi;
    }

    // compressed config delivered through the URL
    if let Some(compressed) = &state.compressed_config {
        let mut next = location.clone();
        let mut params = SearchParams::from_url(&next);
        params.remove(CONFIG_PARAM);
        params.remove(CONFIG_REQUEST_PARAM);
        params.apply(&mut next);
        return Resolution::ApplyConfigFromUrl {
            compressed: compressed.clone(),
            next: translate_pending_redirect(&next),
        };
    }

    Resolution::RegisterAndNavigate(translate_pending_redirect(location))
}

/// Build the URL that parks a navigation at an origin root with the
/// original path, query and hash stashed in the pending-path parameter.
///
/// The path is percent-decoded once before embedding so repeated round
/// trips cannot double-encode it. Query parameters already present on the
/// base URL survive.
pub fn pending_redirect_url(original: &Url, target: Option<&Url>) -> Url {
    let pathname = decode_component(original.path());
    let search = original.query().map(|q| format!("?{q}")).unwrap_or_default();
    let hash = original
        .fragment()
        .map(|f| format!("#{f}"))
        .unwrap_or_default();
    let redirect = format!("{pathname}{search}{hash}");

    let base = match target {
        Some(target) => target.clone(),
        None => {
            let mut root = original.clone();
            root.set_path("/");
            root.set_query(None);
            root.set_fragment(None);
            root
        }
    };

    let mut params = SearchParams::from_url(&base);
    if redirect != "/" {
        params.set(REDIRECT_PARAM, &redirect);
    }
    let mut out = base;
    params.apply(&mut out);
    out
}

/// Translate a parked pending-path parameter back into the real path,
/// keeping every foreign query parameter and the fragment.
pub fn translate_pending_redirect(location: &Url) -> Url {
    let mut params = SearchParams::from_url(location);
    let Some(stored) = params.get(REDIRECT_PARAM).map(String::from) else {
        return location.clone();
    };
    params.remove(REDIRECT_PARAM);

    // stored form is "<path>[?query][#fragment]", decoded once by the
    // query parser
    let (rest, fragment) = match stored.split_once('#') {
        Some((rest, fragment)) => (rest.to_string(), Some(fragment.to_string())),
        None => (stored, None),
    };
    let (path, inner_query) = match rest.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (rest, None),
    };

    let mut out = location.clone();
    out.set_path(&path);

    // deep-link parameters from the stored value win over ones riding on
    // the entry URL
    if let Some(query) = inner_query {
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            match pair.split_once('=') {
                Some((key, value)) => params.set(&decode_component(key), &decode_component(value)),
                None => params.set(&decode_component(pair), ""),
            }
        }
    }
    params.apply(&mut out);

    if let Some(fragment) = &fragment {
        out.set_fragment(Some(fragment));
    }
    out
}

/// The URL a subdomain sends the browser to when it needs the root
/// origin's config: the root with the request marker and the full reply
/// target attached.
fn config_request_url(location: &Url) -> Url {
    let root = gateway_root(location);
    let mut params = SearchParams::from_url(&root);
    params.set(CONFIG_REQUEST_PARAM, "true");
    params.set(TARGET_PARAM, location.as_str());

    let mut out = root;
    params.apply(&mut out);
    out
}

/// Attach the compressed config to the reply target the subdomain asked
/// to be sent back to.
pub fn serve_config_url(reply_to: &Url, config: &GatewayConfig) -> Result<Url, SyncError> {
    let compressed = compress_config(config)?;
    let mut params = SearchParams::from_url(reply_to);
    params.set(CONFIG_PARAM, &compressed);

    let mut out = reply_to.clone();
    params.apply(&mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID_V0: &str = "QmbWqxBEKC3P8tqsKc98xmWNzrzDtRLMiMPL8wBuTGsMnR";
    const CID_V1_BASE32: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn state() -> NavigationState {
        NavigationState {
            has_config: false,
            is_isolated_origin: false,
            url_has_subdomain_config_request: false,
            supports_subdomains: None,
            compressed_config: None,
            request_for_content_addressed_data: false,
        }
    }

    #[test]
    fn test_plain_request_renders_ui() {
        let resolution = resolve(&url("https://example.com/"), &state());
        assert_eq!(resolution, Resolution::RenderUi);
    }

    #[test]
    fn test_configured_subdomain_renders_content() {
        let mut s = state();
        s.is_isolated_origin = true;
        s.has_config = true;
        s.request_for_content_addressed_data = true;

        let resolution = resolve(&url("https://bafkqaaa.ipfs.example.com/file"), &s);
        assert_eq!(resolution, Resolution::RenderContent);
    }

    #[test]
    fn test_path_request_with_support_redirects_to_subdomain() {
        let mut s = state();
        s.request_for_content_addressed_data = true;
        s.supports_subdomains = Some(true);

        let location = url(&format!("https://example.com/ipfs/{CID_V0}/a?x=1#frag"));
        match resolve(&location, &s) {
            Resolution::RedirectToSubdomain(target) => {
                assert_eq!(
                    target.as_str(),
                    format!("https://{CID_V1_BASE32}.ipfs.example.com/a?x=1#frag")
                );
            }
            other => panic!("expected subdomain redirect, got {other:?}"),
        }
    }

    #[test]
    fn test_path_request_without_support_parks_at_root() {
        let mut s = state();
        s.request_for_content_addressed_data = true;
        s.supports_subdomains = Some(false);

        let location = url(&format!("https://example.com/ipfs/{CID_V0}/a%20b?x=1"));
        match resolve(&location, &s) {
            Resolution::RedirectToRootScope(target) => {
                assert_eq!(target.path(), "/");
                let params = SearchParams::from_url(&target);
                assert_eq!(params.get("x"), None, "x rides inside the pending path");
                assert_eq!(
                    params.get(REDIRECT_PARAM),
                    Some(format!("/ipfs/{CID_V0}/a b?x=1").as_str())
                );
            }
            other => panic!("expected root-scope redirect, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_support_also_parks_at_root() {
        let mut s = state();
        s.request_for_content_addressed_data = true;
        s.supports_subdomains = None;

        let location = url(&format!("https://example.com/ipfs/{CID_V0}"));
        assert!(matches!(
            resolve(&location, &s),
            Resolution::RedirectToRootScope(_)
        ));
    }

    #[test]
    fn test_unconfigured_subdomain_requests_config_from_root() {
        let mut s = state();
        s.is_isolated_origin = true;
        s.supports_subdomains = Some(true);
        s.request_for_content_addressed_data = true;

        let location = url(&format!(
            "https://{CID_V1_BASE32}.ipfs.example.com/a?x=1"
        ));
        match resolve(&location, &s) {
            Resolution::RequestConfigFromRoot(target) => {
                assert_eq!(target.host_str(), Some("example.com"));
                let params = SearchParams::from_url(&target);
                assert_eq!(params.get(CONFIG_REQUEST_PARAM), Some("true"));
                assert_eq!(params.get(TARGET_PARAM), Some(location.as_str()));
            }
            other => panic!("expected config request, got {other:?}"),
        }
    }

    #[test]
    fn test_root_serves_config_to_reply_target() {
        let mut s = state();
        s.url_has_subdomain_config_request = true;

        let reply = format!("https://{CID_V1_BASE32}.ipfs.example.com/a?x=1");
        let location = url(&format!(
            "https://example.com/?gw-config-request=true&gw-target={}",
            crate::gateway::params::encode_component(&reply)
        ));
        match resolve(&location, &s) {
            Resolution::ServeConfigToSubdomain { reply_to } => {
                assert_eq!(reply_to.as_str(), reply);
            }
            other => panic!("expected config serve, got {other:?}"),
        }
    }

    #[test]
    fn test_marker_without_target_falls_back_to_ui() {
        let mut s = state();
        s.url_has_subdomain_config_request = true;
        let location = url("https://example.com/?gw-config-request=true");
        assert_eq!(resolve(&location, &s), Resolution::RenderUi);
    }

    #[test]
    fn test_compressed_config_is_applied_and_stripped() {
        let mut s = state();
        s.is_isolated_origin = true;
        s.supports_subdomains = Some(true);
        s.request_for_content_addressed_data = true;
        s.compressed_config = Some("payload".to_string());

        let location = url(&format!(
            "https://{CID_V1_BASE32}.ipfs.example.com/a?x=1&gw-config=payload"
        ));
        match resolve(&location, &s) {
            Resolution::ApplyConfigFromUrl { compressed, next } => {
                assert_eq!(compressed, "payload");
                assert_eq!(
                    next.as_str(),
                    format!("https://{CID_V1_BASE32}.ipfs.example.com/a?x=1")
                );
            }
            other => panic!("expected config apply, got {other:?}"),
        }
    }

    #[test]
    fn test_pending_redirect_round_trip_preserves_foreign_params() {
        let original = url(&format!(
            "https://example.com/ipfs/{CID_V0}/deep/link?x=1&y=a%20b#frag"
        ));
        let parked = pending_redirect_url(&original, None);

        assert_eq!(parked.path(), "/");
        let translated = translate_pending_redirect(&parked);

        assert_eq!(translated.path(), format!("/ipfs/{CID_V0}/deep/link"));
        let params = SearchParams::from_url(&translated);
        assert_eq!(params.get("x"), Some("1"));
        assert_eq!(params.get("y"), Some("a b"));
        assert!(!params.contains(REDIRECT_PARAM));
        assert_eq!(translated.fragment(), Some("frag"));
    }

    #[test]
    fn test_pending_redirect_is_omitted_for_root_path() {
        let parked = pending_redirect_url(&url("https://example.com/"), None);
        assert_eq!(parked.query(), None);
    }

    #[test]
    fn test_translate_without_marker_is_identity() {
        let location = url("https://example.com/a?x=1");
        assert_eq!(translate_pending_redirect(&location), location);
    }

    #[test]
    fn test_serve_config_url_attaches_payload() {
        let reply = url("https://bafkqaaa.ipfs.example.com/a?x=1");
        let served = serve_config_url(&reply, &GatewayConfig::default()).unwrap();

        let params = SearchParams::from_url(&served);
        assert!(params.contains(CONFIG_PARAM));
        assert_eq!(params.get("x"), Some("1"));

        let payload = params.get(CONFIG_PARAM).unwrap();
        let round_tripped = crate::sync::compress::decompress_config(payload).unwrap();
        assert_eq!(round_tripped, GatewayConfig::default());
    }
}
