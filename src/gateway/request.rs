//! Gateway request parsing.
//!
//! # Responsibilities
//! - Recognize the three URL shapes that name content-addressed data:
//!   path form (`/ipfs/<id>/..`), subdomain form (`<id>.ipfs.<host>/..`),
//!   and native form (`ipfs://<id>/..`)
//! - Split the hostname of a subdomain request into label, namespace and
//!   parent domain
//!
//! # Design Decisions
//! - Hostname labels are inspected right to left so nested shapes like
//!   `docs.ipfs.tech.ipns.foo.localhost` resolve to the outermost gateway
//!   labels
//! - Identifier validity is not checked here; the address translator owns
//!   the decode-or-pass-through decision

use url::Url;

use crate::gateway::dnslink::{decode_dnslink_label, is_inlined_dnslink};

/// The two content-addressing namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Ipfs,
    Ipns,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Ipfs => "ipfs",
            Namespace::Ipns => "ipns",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "ipfs" => Some(Namespace::Ipfs),
            "ipns" => Some(Namespace::Ipns),
            _ => None,
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request for content-addressed data, parsed out of any supported URL
/// shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    pub namespace: Namespace,
    /// CID string, peer ID string, or (for `ipns`) a DNS domain name.
    pub identifier: String,
    /// Remaining path below the identifier, always starting with `/`.
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl GatewayRequest {
    /// Parse either URL shape, subdomain form first.
    pub fn from_url(url: &Url) -> Option<Self> {
        Self::from_subdomain_url(url).or_else(|| Self::from_path_url(url))
    }

    /// Parse `/ipfs/<id>/<path>` or `/ipns/<id>/<path>`.
    pub fn from_path_url(url: &Url) -> Option<Self> {
        let mut segments = url.path_segments()?;
        let namespace = Namespace::from_label(segments.next()?)?;
        let identifier = segments.next()?;
        if identifier.is_empty() {
            return None;
        }

        let rest: Vec<&str> = segments.collect();
        Some(GatewayRequest {
            namespace,
            identifier: identifier.to_string(),
            path: format!("/{}", rest.join("/")),
            query: url.query().map(String::from),
            fragment: url.fragment().map(String::from),
        })
    }

    /// Parse `<id>.ipfs.<host>/<path>`, un-inlining DNSLink labels.
    pub fn from_subdomain_url(url: &Url) -> Option<Self> {
        let parts = subdomain_parts(url)?;
        let identifier = if parts.namespace == Namespace::Ipns && is_inlined_dnslink(&parts.label)
        {
            decode_dnslink_label(&parts.label)
        } else {
            parts.label
        };

        Some(GatewayRequest {
            namespace: parts.namespace,
            identifier,
            path: url.path().to_string(),
            query: url.query().map(String::from),
            fragment: url.fragment().map(String::from),
        })
    }

    /// Parse `ipfs://<id>[/path]` or `ipns://<name>[/path]`.
    ///
    /// Parsed from the raw string rather than through [`Url`] so that
    /// case-sensitive identifiers are not case-folded as hostnames.
    pub fn from_native(input: &str) -> Option<Self> {
        let (namespace, rest) = if let Some(rest) = input.strip_prefix("ipfs://") {
            (Namespace::Ipfs, rest)
        } else if let Some(rest) = input.strip_prefix("ipns://") {
            (Namespace::Ipns, rest)
        } else {
            return None;
        };

        let (rest, fragment) = match rest.split_once('#') {
            Some((r, f)) => (r, Some(f.to_string())),
            None => (rest, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((r, q)) => (r, Some(q.to_string())),
            None => (rest, None),
        };
        let (identifier, path) = match rest.split_once('/') {
            Some((id, p)) => (id, format!("/{p}")),
            None => (rest, "/".to_string()),
        };
        if identifier.is_empty() {
            return None;
        }

        Some(GatewayRequest {
            namespace,
            identifier: identifier.to_string(),
            path,
            query,
            fragment,
        })
    }
}

/// The hostname of a subdomain gateway request, split apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainParts {
    /// Everything left of the namespace label, dots preserved, case-folded
    /// by the hostname rules.
    pub label: String,
    pub namespace: Namespace,
    /// Parent domain right of the namespace label, port included when the
    /// URL carries one.
    pub parent: String,
}

/// Split a hostname of the shape `<label>.ip[fn]s.<parent>`.
pub fn subdomain_parts(url: &Url) -> Option<SubdomainParts> {
    let host = url.host_str()?;
    let labels: Vec<&str> = host.split('.').collect();

    for i in (0..labels.len()).rev() {
        let Some(namespace) = Namespace::from_label(labels[i]) else {
            continue;
        };
        if i == 0 || i == labels.len() - 1 {
            return None;
        }
        let mut parent = labels[i + 1..].join(".");
        if let Some(port) = url.port() {
            parent = format!("{parent}:{port}");
        }
        return Some(SubdomainParts {
            label: labels[..i].join("."),
            namespace,
            parent,
        });
    }
    None
}

/// Whether the URL names content-addressed data by path or by subdomain.
pub fn is_path_or_subdomain_request(url: &Url) -> bool {
    GatewayRequest::from_path_url(url).is_some() || subdomain_parts(url).is_some()
}
