//! Gateway addressing: URL shapes, DNSLink labels, reserved parameters and
//! the path/subdomain translation between them.

pub mod dnslink;
pub mod params;
pub mod request;
pub mod translate;

pub use dnslink::{decode_dnslink_label, encode_dnslink_label, is_inlined_dnslink};
pub use request::{is_path_or_subdomain_request, subdomain_parts, GatewayRequest, Namespace};
pub use translate::{
    gateway_root, to_path_url, to_subdomain_url, PathRecovery, SubdomainRedirect,
    IMMUTABLE_CACHE_CONTROL,
};
