//! CID parsing and canonicalization.
//!
//! A version-0 CID is a bare base58btc multihash (46 chars, `Qm` prefix)
//! with an implicit `dag-pb` codec. A version-1 CID is
//! `varint(1) || varint(codec) || multihash`, carried in any multibase
//! encoding.

use crate::codec::base::{
    base16_decode, base32_decode, base36_decode, base58_decode, base64url_decode,
};
use crate::codec::varint;

/// Multicodec for `dag-pb`, the implicit codec of CIDv0.
pub const DAG_PB: u64 = 0x70;

/// Multicodec wrapping a multihash as a libp2p public key record.
pub const LIBP2P_KEY: u64 = 0x72;

/// Multicodec for raw bytes.
pub const RAW: u64 = 0x55;

/// A parsed content identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cid {
    /// 0 or 1.
    pub version: u8,
    /// Unsigned-varint multicodec value.
    pub codec: u64,
    /// The multihash: exactly the trailing bytes after the varint header.
    pub multihash: Vec<u8>,
    /// The full binary form the text decoded to.
    pub raw: Vec<u8>,
}

impl Cid {
    /// The CIDv1 binary form, wrapping the multihash with `codec` when this
    /// is a version-0 CID.
    pub fn to_v1_bytes(&self, codec: u64) -> Vec<u8> {
        if self.version == 0 {
            canonicalize_to_v1(&self.multihash, codec)
        } else {
            self.raw.clone()
        }
    }
}

/// Parse a CID from text.
///
/// Dispatch order: exact length-46 `Qm` strings are CIDv0; otherwise the
/// first character selects a multibase; otherwise bare base58btc is
/// attempted and the decoded version varint must equal 1. Every failure
/// collapses to `None` so callers treat the input as "not a gateway
/// identifier" rather than an error.
pub fn decode_cid(text: &str) -> Option<Cid> {
    if text.len() < 2 {
        return None;
    }

    // CIDv0: bare base58btc multihash starting with Qm
    if text.len() == 46 && text.starts_with("Qm") {
        let bytes = base58_decode(text).ok()?;
        return Some(Cid {
            version: 0,
            codec: DAG_PB,
            multihash: bytes.clone(),
            raw: bytes,
        });
    }

    let prefix = text.chars().next()?;
    let rest = &text[prefix.len_utf8()..];

    let bytes = match prefix {
        'b' => base32_decode(rest).ok()?,
        'k' => base36_decode(rest).ok()?,
        'z' => base58_decode(rest).ok()?,
        'f' | 'F' => base16_decode(rest).ok()?,
        'u' => base64url_decode(rest).ok()?,
        _ => {
            // bare base58btc fallback; only well-formed CIDv1 bytes are
            // accepted here
            let bytes = base58_decode(text).ok()?;
            let (version, _) = varint::decode(&bytes, 0).ok()?;
            if version != 1 {
                return None;
            }
            bytes
        }
    };

    let (version, version_len) = varint::decode(&bytes, 0).ok()?;
    if version != 1 {
        return None;
    }
    let (codec, codec_len) = varint::decode(&bytes, version_len).ok()?;
    let multihash = bytes.get(version_len + codec_len..)?.to_vec();

    Some(Cid {
        version: 1,
        codec,
        multihash,
        raw: bytes,
    })
}

/// Build CIDv1 bytes: `varint(1) || varint(codec) || multihash`.
pub fn canonicalize_to_v1(multihash: &[u8], codec: u64) -> Vec<u8> {
    let mut out = varint::encode(1);
    out.extend_from_slice(&varint::encode(codec));
    out.extend_from_slice(multihash);
    out
}
