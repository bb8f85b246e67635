//! Self-describing binary identifier codec.
//!
//! # Responsibilities
//! - Multibase text encoding/decoding (base58btc, base32, base36, base16, base64url)
//! - Unsigned varint (LEB128) encoding
//! - CID parsing for v0 and v1 forms, canonicalization to CIDv1 bytes
//!
//! # Design Decisions
//! - Decode failures collapse to `None` at the CID layer so callers treat an
//!   unparseable identifier as "not a gateway request", never as an error
//! - Big-integer bases (58/36) use schoolbook conversion over a fixed-size
//!   digit buffer; leading zero bytes/digits are counted and re-prepended
//!   separately because naive big-int conversion destroys them

pub mod base;
pub mod cid;
pub mod varint;

pub use base::{decode_multibase, encode_multibase, Multibase};
pub use cid::{canonicalize_to_v1, decode_cid, Cid, DAG_PB, LIBP2P_KEY, RAW};

use thiserror::Error;

/// Errors produced by the multibase and varint decoders.
///
/// These never escape the address-translation layer; `decode_cid` collapses
/// them to `None`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// First character does not select a supported base.
    #[error("unknown multibase prefix: {0:?}")]
    UnknownPrefix(char),

    /// A character outside the alphabet of the selected base.
    #[error("invalid {base} character: {character:?}")]
    InvalidCharacter {
        base: &'static str,
        character: char,
    },

    /// Multibase string with no content.
    #[error("empty multibase string")]
    Empty,

    /// Varint ended before its final byte.
    #[error("truncated varint")]
    TruncatedVarint,

    /// Varint with more continuation bytes than any supported value needs.
    #[error("varint too long")]
    VarintTooLong,
}
