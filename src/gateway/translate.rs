//! Gateway address translation.
//!
//! # Responsibilities
//! - Rewrite path-form URLs to their canonical isolated-origin subdomain
//!   form, canonicalizing identifiers on the way
//! - Recover the path form (and the identifier's original case) from a
//!   subdomain-form URL
//!
//! # Design Decisions
//! - Identifier decode failure means pass-through, never an error or a
//!   broken redirect; malformed paths must still reach upstream error
//!   handling
//! - The edge redirector and the in-browser worker both call these exact
//!   functions, so redirect targets are byte-identical and shared edge
//!   cache keys stay valid

use url::Url;

use crate::codec::{
    base::base58_decode, canonicalize_to_v1, decode_cid, encode_multibase, Multibase, DAG_PB,
    LIBP2P_KEY,
};
use crate::gateway::dnslink::{decode_dnslink_label, encode_dnslink_label, is_inlined_dnslink};
use crate::gateway::request::{subdomain_parts, GatewayRequest, Namespace, SubdomainParts};

/// Cache lifetime for redirects to canonical content-addressed URLs: the
/// target names immutable content, so it may be cached indefinitely.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// A permanent redirect to a canonical gateway URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainRedirect {
    pub location: Url,
    /// Always 301.
    pub status: u16,
    /// Always [`IMMUTABLE_CACHE_CONTROL`].
    pub cache_control: &'static str,
}

impl SubdomainRedirect {
    fn to(location: Url) -> Self {
        Self {
            location,
            status: 301,
            cache_control: IMMUTABLE_CACHE_CONTROL,
        }
    }
}

/// Outcome of recovering the path form of a subdomain URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRecovery {
    /// The hostname is not a subdomain gateway shape.
    NotGateway,
    /// The equivalent path-form URL, identifier case restored.
    Recovered(Url),
    /// A legacy base58btc peer-id label; answer with a redirect to its
    /// canonical base36 CIDv1 origin instead of resolving directly.
    CanonicalRedirect(SubdomainRedirect),
}

/// Compute the canonical subdomain URL for a path-form request.
///
/// Returns `None` (pass through, do not redirect) when the URL is not a
/// path-form gateway request or the identifier does not decode.
pub fn to_subdomain_url(url: &Url) -> Option<SubdomainRedirect> {
    let request = GatewayRequest::from_path_url(url)?;
    let label = subdomain_label(&request)?;

    let host = host_with_port(url)?;
    let search = url.query().map(|q| format!("?{q}")).unwrap_or_default();
    let location = format!(
        "{}://{}.{}.{}{}{}",
        url.scheme(),
        label,
        request.namespace,
        host,
        request.path,
        search
    );

    Url::parse(&location).ok().map(SubdomainRedirect::to)
}

/// The canonical subdomain label for a gateway request, lowercase.
pub fn subdomain_label(request: &GatewayRequest) -> Option<String> {
    match request.namespace {
        Namespace::Ipfs => {
            let cid = decode_cid(&request.identifier)?;
            Some(encode_multibase(
                &cid.to_v1_bytes(DAG_PB),
                Multibase::Base32Lower,
            ))
        }
        Namespace::Ipns => {
            if request.identifier.contains('.') {
                return Some(encode_dnslink_label(&request.identifier));
            }
            let v1 = ipns_name_to_v1_bytes(&request.identifier)?;
            Some(encode_multibase(&v1, Multibase::Base36Lower))
        }
    }
}

/// CIDv1 `libp2p-key` bytes for an IPNS name: a CID in any encoding, a
/// CIDv0-shaped peer ID, or a legacy bare base58btc peer ID.
fn ipns_name_to_v1_bytes(identifier: &str) -> Option<Vec<u8>> {
    if let Some(cid) = decode_cid(identifier) {
        return Some(cid.to_v1_bytes(LIBP2P_KEY));
    }

    // ed25519 peer IDs are bare identity multihashes; wrap them directly
    if identifier.starts_with("12D3K") {
        let multihash = base58_decode(identifier).ok()?;
        return Some(canonicalize_to_v1(&multihash, LIBP2P_KEY));
    }
    None
}

/// Recover the canonical path-form URL for a gateway request.
///
/// Subdomain-form URLs recover to `{parent}/{ns}/{id}{path}`; hostnames
/// are case-insensitive on the wire but CIDs and peer IDs are not, so the
/// identifier's original case is recovered by locating the case-folded
/// label inside the raw href and slicing the real bytes out. Path-form
/// URLs are already canonical, except legacy base58btc peer-id names,
/// which answer with a redirect to their base36 CIDv1 form.
pub fn to_path_url(url: &Url) -> PathRecovery {
    if let Some(parts) = subdomain_parts(url) {
        return recover_from_subdomain(url, &parts);
    }

    let Some(request) = GatewayRequest::from_path_url(url) else {
        return PathRecovery::NotGateway;
    };

    if request.namespace == Namespace::Ipns && request.identifier.starts_with("12D3K") {
        if let Some(v1) = ipns_name_to_v1_bytes(&request.identifier) {
            let label = encode_multibase(&v1, Multibase::Base36Lower);
            let mut canonical = url.clone();
            canonical.set_path(&format!("/ipns/{label}{}", request.path));
            return PathRecovery::CanonicalRedirect(SubdomainRedirect::to(canonical));
        }
    }

    PathRecovery::Recovered(url.clone())
}

fn recover_from_subdomain(url: &Url, parts: &SubdomainParts) -> PathRecovery {
    let scheme = url.scheme();
    let search = url.query().map(|q| format!("?{q}")).unwrap_or_default();

    if parts.namespace == Namespace::Ipns && is_inlined_dnslink(&parts.label) {
        let domain = decode_dnslink_label(&parts.label);
        let location = format!(
            "{scheme}://{}/ipns/{domain}{}{search}",
            parts.parent,
            url.path()
        );
        return match Url::parse(&location) {
            Ok(u) => PathRecovery::Recovered(u),
            Err(_) => PathRecovery::NotGateway,
        };
    }

    let identifier = recover_case(url.as_str(), &parts.label);

    if identifier.starts_with("12D3K") {
        if let Some(v1) = ipns_name_to_v1_bytes(&identifier) {
            let label = encode_multibase(&v1, Multibase::Base36Lower);
            let location = format!(
                "{scheme}://{label}.ipns.{}{}{search}",
                parts.parent,
                url.path()
            );
            if let Ok(u) = Url::parse(&location) {
                return PathRecovery::CanonicalRedirect(SubdomainRedirect::to(u));
            }
        }
    }

    let location = format!(
        "{scheme}://{}/{}/{identifier}{}{search}",
        parts.parent,
        parts.namespace,
        url.path()
    );
    match Url::parse(&location) {
        Ok(u) => PathRecovery::Recovered(u),
        Err(_) => PathRecovery::NotGateway,
    }
}

/// The shared root origin of a gateway URL: the parent domain for a
/// subdomain request, the origin itself otherwise.
pub fn gateway_root(url: &Url) -> Url {
    let root = match subdomain_parts(url) {
        Some(parts) => format!("{}://{}/", url.scheme(), parts.parent),
        None => {
            let host = host_with_port(url).unwrap_or_default();
            format!("{}://{}/", url.scheme(), host)
        }
    };
    // the input URL already parsed, so its origin does too
    Url::parse(&root).unwrap_or_else(|_| url.clone())
}

fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Slice the original-case identifier out of the raw href by locating its
/// case-folded form. Falls back to the folded label when the href does not
/// contain it.
fn recover_case(href: &str, folded: &str) -> String {
    let lowered = href.to_ascii_lowercase();
    match lowered.find(&folded.to_ascii_lowercase()) {
        Some(pos) => href[pos..pos + folded.len()].to_string(),
        None => folded.to_string(),
    }
}
