//! Reserved wire names and URL parameter plumbing.
//!
//! # Responsibilities
//! - Name the query parameters and hash fragments the gateway reserves for
//!   itself on the wire
//! - Build search strings that encode spaces as `%20` (form encoding would
//!   produce `+`, which does not survive a path round trip)
//! - Read and edit `key=value` hash fragments
//!
//! # Design Decisions
//! - Parameter order is preserved; setting an existing key overwrites in
//!   place instead of reordering
//! - `decode_component` leaves malformed escapes untouched so a value is
//!   never decoded twice by accident

use url::Url;

/// Pending-path parameter: carries the original path, query and hash while
/// the navigation is parked at an origin root.
pub const REDIRECT_PARAM: &str = "gw-redirect";

/// Compressed configuration payload riding across an origin boundary.
pub const CONFIG_PARAM: &str = "gw-config";

/// Marker a subdomain attaches when asking the root origin for its config.
pub const CONFIG_REQUEST_PARAM: &str = "gw-config-request";

/// Redirect target used by the origin-isolation warning flow.
pub const TARGET_PARAM: &str = "gw-target";

/// Every query parameter the gateway claims for itself.
pub const RESERVED_PARAMS: [&str; 4] = [
    REDIRECT_PARAM,
    CONFIG_PARAM,
    CONFIG_REQUEST_PARAM,
    TARGET_PARAM,
];

/// Hash fragments that address gateway UI pages rather than content.
pub const UI_FRAGMENTS: [&str; 2] = ["/gw-config", "gw-origin-isolation-warning"];

fn is_component_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')'
        )
}

/// Percent-encode a URI component (the `encodeURIComponent` character set,
/// so spaces become `%20`).
pub fn encode_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for &byte in text.as_bytes() {
        if is_component_safe(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Percent-decode a URI component once. Malformed escapes and invalid
/// UTF-8 leave the input unchanged.
pub fn decode_component(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex_val = |b: u8| (b as char).to_digit(16).map(|d| d as u8);
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(out).unwrap_or_else(|_| text.to_string())
}

/// An ordered, editable view of a URL's query parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    /// Decode the query of `url` into ordered pairs.
    pub fn from_url(url: &Url) -> Self {
        let pairs = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Overwrite the first occurrence of `key` in place, or append.
    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(pair) = self.pairs.iter_mut().find(|(k, _)| k == key) {
            pair.1 = value.to_string();
        } else {
            self.pairs.push((key.to_string(), value.to_string()));
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// Drop every reserved gateway parameter.
    pub fn remove_reserved(&mut self) {
        self.pairs
            .retain(|(k, _)| !RESERVED_PARAMS.contains(&k.as_str()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Format as `?k=v&..`, or an empty string when there are no pairs.
    pub fn format(&self) -> String {
        if self.pairs.is_empty() {
            return String::new();
        }
        let joined = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("?{joined}")
    }

    /// Write these pairs back onto `url`, replacing its query.
    pub fn apply(&self, url: &mut Url) {
        if self.pairs.is_empty() {
            url.set_query(None);
        } else {
            let formatted = self.format();
            url.set_query(Some(&formatted[1..]));
        }
    }
}

/// Parse a `#k=v&k2` fragment into ordered pairs; bare keys carry no value.
pub fn parse_hash_fragments(hash: &str) -> Vec<(String, Option<String>)> {
    let hash = hash.strip_prefix('#').unwrap_or(hash);
    if hash.is_empty() {
        return Vec::new();
    }

    hash.split('&')
        .filter_map(|pair| {
            if pair.is_empty() {
                return None;
            }
            match pair.split_once('=') {
                Some((k, v)) => Some((decode_component(k), Some(decode_component(v)))),
                None => Some((decode_component(pair), None)),
            }
        })
        .collect()
}

/// Read one hash-fragment value from `url`.
pub fn get_hash_fragment(url: &Url, key: &str) -> Option<String> {
    parse_hash_fragments(url.fragment().unwrap_or(""))
        .into_iter()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v)
}

/// Whether `key` appears in the URL's hash fragment, with or without a
/// value.
pub fn has_hash_fragment(url: &Url, key: &str) -> bool {
    parse_hash_fragments(url.fragment().unwrap_or(""))
        .iter()
        .any(|(k, _)| k == key)
}

/// Set one hash-fragment key on `url` in place.
pub fn set_hash_fragment(url: &mut Url, key: &str, value: Option<&str>) {
    let mut fragments = parse_hash_fragments(url.fragment().unwrap_or(""));
    let owned = value.map(String::from);
    if let Some(existing) = fragments.iter_mut().find(|(k, _)| k == key) {
        existing.1 = owned;
    } else {
        fragments.push((key.to_string(), owned));
    }
    write_fragments(url, &fragments);
}

/// Remove one hash-fragment key from `url` in place.
pub fn delete_hash_fragment(url: &mut Url, key: &str) {
    let mut fragments = parse_hash_fragments(url.fragment().unwrap_or(""));
    fragments.retain(|(k, _)| k != key);
    write_fragments(url, &fragments);
}

fn write_fragments(url: &mut Url, fragments: &[(String, Option<String>)]) {
    if fragments.is_empty() {
        url.set_fragment(None);
        return;
    }
    let joined = fragments
        .iter()
        .map(|(k, v)| match v {
            Some(v) => format!("{k}={}", encode_component(v)),
            None => k.clone(),
        })
        .collect::<Vec<_>>()
        .join("&");
    url.set_fragment(Some(&joined));
}

/// Whether the URL addresses a gateway UI page via its hash fragment.
pub fn is_ui_page_request(url: &Url) -> bool {
    let Some(fragment) = url.fragment() else {
        return false;
    };
    UI_FRAGMENTS
        .iter()
        .any(|page| fragment.starts_with(page) || fragment.starts_with(&format!("/{page}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_component_encoding_uses_percent_twenty() {
        assert_eq!(encode_component("a b"), "a%20b");
        assert_eq!(encode_component("a/b?c=d"), "a%2Fb%3Fc%3Dd");
        assert_eq!(encode_component("safe-._!~*'()"), "safe-._!~*'()");
        assert_eq!(decode_component("a%20b"), "a b");
        assert_eq!(decode_component("100%"), "100%");
        assert_eq!(decode_component("%zz"), "%zz");
    }

    #[test]
    fn test_decode_is_single_pass() {
        // a value that was encoded twice must come back encoded once
        assert_eq!(decode_component("%252F"), "%2F");
    }

    #[test]
    fn test_search_params_preserve_order_and_overwrite_in_place() {
        let mut params = SearchParams::from_url(&url("https://x.example/?a=1&b=2&c=3"));
        params.set("b", "two");
        params.set("d", "4");
        assert_eq!(params.format(), "?a=1&b=two&c=3&d=4");
    }

    #[test]
    fn test_search_params_apply_round_trip() {
        let mut target = url("https://x.example/p");
        let mut params = SearchParams::default();
        params.set("q", "a b");
        params.apply(&mut target);
        assert_eq!(target.as_str(), "https://x.example/p?q=a%20b");

        let back = SearchParams::from_url(&target);
        assert_eq!(back.get("q"), Some("a b"));

        SearchParams::default().apply(&mut target);
        assert_eq!(target.query(), None);
    }

    #[test]
    fn test_remove_reserved() {
        let mut params = SearchParams::from_url(&url(
            "https://x.example/?gw-redirect=%2Fa&keep=1&gw-config=zzz",
        ));
        params.remove_reserved();
        assert_eq!(params.format(), "?keep=1");
    }

    #[test]
    fn test_hash_fragment_round_trip() {
        let mut u = url("https://x.example/");
        set_hash_fragment(&mut u, "origin", Some("https://sub.example"));
        assert_eq!(
            get_hash_fragment(&u, "origin").as_deref(),
            Some("https://sub.example")
        );
        assert!(has_hash_fragment(&u, "origin"));

        set_hash_fragment(&mut u, "flag", None);
        assert!(has_hash_fragment(&u, "flag"));
        assert_eq!(get_hash_fragment(&u, "flag"), None);

        delete_hash_fragment(&mut u, "origin");
        assert!(!has_hash_fragment(&u, "origin"));

        delete_hash_fragment(&mut u, "flag");
        assert_eq!(u.fragment(), None);
    }

    #[test]
    fn test_ui_page_detection() {
        assert!(is_ui_page_request(&url("https://x.example/#/gw-config")));
        assert!(is_ui_page_request(&url(
            "https://x.example/#gw-origin-isolation-warning"
        )));
        assert!(!is_ui_page_request(&url("https://x.example/#readme")));
        assert!(!is_ui_page_request(&url("https://x.example/")));
    }
}
