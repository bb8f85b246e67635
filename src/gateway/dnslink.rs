//! DNSLink label inlining.
//!
//! DNSLink names contain dots, so they must be inlined into a single DNS
//! label to get a unique origin and to work with wildcard TLS certificates.
//! Every literal `-` becomes `--`, then every `.` becomes `-`; decoding
//! substitutes the `--` runs first because naively reversing character
//! classes is ambiguous when a domain has both hyphens and a hyphen run.

/// Inline a DNSLink domain into a single DNS label.
///
/// `en.wikipedia-on-ipfs.org` -> `en-wikipedia--on--ipfs-org`
pub fn encode_dnslink_label(domain: &str) -> String {
    domain.replace('-', "--").replace('.', "-")
}

/// Recover a DNSLink domain from an inlined label. Exact inverse of
/// [`encode_dnslink_label`].
pub fn decode_dnslink_label(label: &str) -> String {
    // '\u{0}' cannot occur in a DNS label, so it is a safe sentinel for
    // the substitute-then-restore pass
    label
        .replace("--", "\u{0}")
        .replace('-', ".")
        .replace('\u{0}', "-")
}

/// DNS labels are up to 63 characters of alphanumerics or hyphens and must
/// not start or end with a hyphen.
fn is_valid_dns_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    if bytes.is_empty() || bytes.len() > 63 {
        return false;
    }
    if !bytes[0].is_ascii_alphanumeric() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return false;
    }
    bytes
        .iter()
        .all(|&c| c.is_ascii_alphanumeric() || c == b'-')
}

/// Whether a subdomain label looks like an inlined DNSLink name.
///
/// CIDs and peer IDs never contain hyphens, so a well-formed label with a
/// hyphen and no dot can only be an inlined domain.
pub fn is_inlined_dnslink(label: &str) -> bool {
    is_valid_dns_label(label) && label.contains('-') && !label.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_vector() {
        assert_eq!(
            encode_dnslink_label("en.wikipedia-on-ipfs.org"),
            "en-wikipedia--on--ipfs-org"
        );
    }

    #[test]
    fn test_round_trip() {
        for domain in [
            "example.net",
            "en.wikipedia-on-ipfs.org",
            "a-b.c",
            "a--b.c-d.e",
            "nodots",
        ] {
            let label = encode_dnslink_label(domain);
            assert_eq!(decode_dnslink_label(&label), domain, "domain {domain}");
            assert_eq!(
                encode_dnslink_label(&decode_dnslink_label(&label)),
                label,
                "label {label}"
            );
        }
    }

    #[test]
    fn test_inlined_detection() {
        assert!(is_inlined_dnslink("en-wikipedia--on--ipfs-org"));
        assert!(!is_inlined_dnslink("bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi"));
        assert!(!is_inlined_dnslink("docs.ipfs.tech"));
        assert!(!is_inlined_dnslink("-leading"));
        assert!(!is_inlined_dnslink("trailing-"));
        assert!(!is_inlined_dnslink(""));
    }
}
