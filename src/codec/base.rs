//! Multibase text encodings.
//!
//! # Responsibilities
//! - Encode/decode base58btc, base32 lower, base36 lower, base16, base64url
//! - Map multibase prefix characters to bases and back
//!
//! # Design Decisions
//! - Prefix characters are disjoint from the alphabets they introduce, so a
//!   prefixed string is always unambiguous
//! - base16 accepts either case and left-pads odd-length input with a zero
//!   nibble; base32/base36 fold input to lowercase before decoding
//! - base58/base36 round-trip leading zero bytes via a leading `'1'`/`'0'`
//!   run counted separately from the converted remainder

use crate::codec::CodecError;

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";
const BASE64URL_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
const BASE16_ALPHABET: &[u8; 16] = b"0123456789abcdef";

/// A supported multibase encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multibase {
    /// Prefix `z`; also the legacy prefix-free encoding of CIDv0 and peer IDs.
    Base58Btc,
    /// Prefix `b`; RFC 4648 lowercase, unpadded.
    Base32Lower,
    /// Prefix `k`.
    Base36Lower,
    /// Prefix `f` (or `F` on input); case-insensitive hex.
    Base16Lower,
    /// Prefix `u`; URL-safe alphabet, unpadded.
    Base64Url,
}

impl Multibase {
    /// The prefix character written by [`encode_multibase`].
    pub fn prefix(self) -> char {
        match self {
            Multibase::Base58Btc => 'z',
            Multibase::Base32Lower => 'b',
            Multibase::Base36Lower => 'k',
            Multibase::Base16Lower => 'f',
            Multibase::Base64Url => 'u',
        }
    }

    /// Select a base from a prefix character.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'z' => Some(Multibase::Base58Btc),
            'b' => Some(Multibase::Base32Lower),
            'k' => Some(Multibase::Base36Lower),
            'f' | 'F' => Some(Multibase::Base16Lower),
            'u' => Some(Multibase::Base64Url),
            _ => None,
        }
    }

    /// Encode `bytes` without the prefix character.
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Multibase::Base58Btc => base58_encode(bytes),
            Multibase::Base32Lower => base32_encode(bytes),
            Multibase::Base36Lower => base36_encode(bytes),
            Multibase::Base16Lower => base16_encode(bytes),
            Multibase::Base64Url => base64url_encode(bytes),
        }
    }

    /// Decode `text` that carries no prefix character.
    pub fn decode(self, text: &str) -> Result<Vec<u8>, CodecError> {
        match self {
            Multibase::Base58Btc => base58_decode(text),
            Multibase::Base32Lower => base32_decode(text),
            Multibase::Base36Lower => base36_decode(text),
            Multibase::Base16Lower => base16_decode(text),
            Multibase::Base64Url => base64url_decode(text),
        }
    }
}

/// Encode `bytes` as a multibase string, prefix character included.
pub fn encode_multibase(bytes: &[u8], base: Multibase) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 1);
    out.push(base.prefix());
    out.push_str(&base.encode(bytes));
    out
}

/// Decode a multibase string, dispatching on its prefix character.
pub fn decode_multibase(text: &str) -> Result<Vec<u8>, CodecError> {
    let mut chars = text.chars();
    let prefix = chars.next().ok_or(CodecError::Empty)?;
    let base = Multibase::from_prefix(prefix).ok_or(CodecError::UnknownPrefix(prefix))?;
    base.decode(chars.as_str())
}

fn digit_value(alphabet: &'static [u8], name: &'static str, c: u8) -> Result<u32, CodecError> {
    alphabet
        .iter()
        .position(|&a| a == c)
        .map(|v| v as u32)
        .ok_or(CodecError::InvalidCharacter {
            base: name,
            character: c as char,
        })
}

fn ascii_only<'a>(text: &'a str, name: &'static str) -> Result<&'a [u8], CodecError> {
    if let Some(c) = text.chars().find(|c| !c.is_ascii()) {
        return Err(CodecError::InvalidCharacter {
            base: name,
            character: c,
        });
    }
    Ok(text.as_bytes())
}

/// Decode base58btc with leading-zero-byte preservation via the `'1'` run.
pub fn base58_decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let input = ascii_only(text, "base58btc")?;
    let zeros = input.iter().take_while(|&&c| c == b'1').count();

    // allocate enough space: log(58)/log(256) ~= 0.733
    let size = (input.len() - zeros) * 733 / 1000 + 1;
    let mut buf = vec![0u8; size];

    for &c in &input[zeros..] {
        let mut carry = digit_value(BASE58_ALPHABET, "base58btc", c)?;
        for digit in buf.iter_mut().rev() {
            carry += 58 * u32::from(*digit);
            *digit = (carry & 0xff) as u8;
            carry >>= 8;
        }
    }

    let start = buf.iter().take_while(|&&b| b == 0).count();
    let mut out = vec![0u8; zeros];
    out.extend_from_slice(&buf[start..]);
    Ok(out)
}

/// Encode base58btc, leading zero bytes becoming a `'1'` run.
pub fn base58_encode(bytes: &[u8]) -> String {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();

    // log(256)/log(58) ~= 1.365
    let size = (bytes.len() - zeros) * 1365 / 1000 + 1;
    let mut digits = vec![0u8; size];

    for &b in &bytes[zeros..] {
        let mut carry = u32::from(b);
        for digit in digits.iter_mut().rev() {
            carry += 256 * u32::from(*digit);
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
    }

    let start = digits.iter().take_while(|&&d| d == 0).count();
    let mut out = String::with_capacity(zeros + size - start);
    for _ in 0..zeros {
        out.push('1');
    }
    for &d in &digits[start..] {
        out.push(BASE58_ALPHABET[d as usize] as char);
    }
    out
}

/// Encode RFC 4648 base32, lowercase, no padding.
pub fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 8 / 5 + 1);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &b in bytes {
        buffer = (buffer << 8) | u32::from(b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

/// Decode RFC 4648 base32, case-insensitive, no padding. Trailing partial
/// bits are discarded.
pub fn base32_decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let lowered = text.to_ascii_lowercase();
    let input = ascii_only(&lowered, "base32")?;
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &c in input {
        let val = digit_value(BASE32_ALPHABET, "base32", c)?;
        buffer = (buffer << 5) | val;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    Ok(out)
}

/// Encode base36, lowercase, leading zero bytes becoming a `'0'` run.
pub fn base36_encode(bytes: &[u8]) -> String {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();

    // estimate output size: log(256)/log(36) ~= 1.548
    let size = (bytes.len() - zeros) * 1548 / 1000 + 1;
    let mut digits = vec![0u8; size];

    for &b in &bytes[zeros..] {
        let mut carry = u32::from(b);
        for digit in digits.iter_mut().rev() {
            carry += 256 * u32::from(*digit);
            *digit = (carry % 36) as u8;
            carry /= 36;
        }
    }

    let start = digits.iter().take_while(|&&d| d == 0).count();
    let mut out = String::with_capacity(zeros + size - start);
    for _ in 0..zeros {
        out.push('0');
    }
    for &d in &digits[start..] {
        out.push(BASE36_ALPHABET[d as usize] as char);
    }
    out
}

/// Decode base36, case-insensitive, with leading-zero preservation.
pub fn base36_decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let lowered = text.to_ascii_lowercase();
    let input = ascii_only(&lowered, "base36")?;
    let zeros = input.iter().take_while(|&&c| c == b'0').count();

    // log(36)/log(256) ~= 0.646
    let size = (input.len() - zeros) * 646 / 1000 + 1;
    let mut buf = vec![0u8; size];

    for &c in &input[zeros..] {
        let mut carry = digit_value(BASE36_ALPHABET, "base36", c)?;
        for digit in buf.iter_mut().rev() {
            carry += 36 * u32::from(*digit);
            *digit = (carry & 0xff) as u8;
            carry >>= 8;
        }
    }

    let start = buf.iter().take_while(|&&b| b == 0).count();
    let mut out = vec![0u8; zeros];
    out.extend_from_slice(&buf[start..]);
    Ok(out)
}

/// Encode lowercase hex.
pub fn base16_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(BASE16_ALPHABET[(b >> 4) as usize] as char);
        out.push(BASE16_ALPHABET[(b & 0x0f) as usize] as char);
    }
    out
}

/// Decode hex, case-insensitive. Odd-length input is left-padded with a
/// zero nibble.
pub fn base16_decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let mut lowered = text.to_ascii_lowercase();
    if lowered.len() % 2 != 0 {
        lowered.insert(0, '0');
    }
    let input = ascii_only(&lowered, "base16")?;
    let mut out = Vec::with_capacity(input.len() / 2);

    for pair in input.chunks_exact(2) {
        let hi = digit_value(BASE16_ALPHABET, "base16", pair[0])?;
        let lo = digit_value(BASE16_ALPHABET, "base16", pair[1])?;
        out.push(((hi << 4) | lo) as u8);
    }
    Ok(out)
}

/// Encode base64url, no padding.
pub fn base64url_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4 / 3 + 1);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &b in bytes {
        buffer = (buffer << 8) | u32::from(b);
        bits += 8;
        while bits >= 6 {
            bits -= 6;
            out.push(BASE64URL_ALPHABET[((buffer >> bits) & 0x3f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE64URL_ALPHABET[((buffer << (6 - bits)) & 0x3f) as usize] as char);
    }
    out
}

/// Decode base64url, no padding. Trailing partial bits are discarded.
pub fn base64url_decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let input = ascii_only(text, "base64url")?;
    let mut out = Vec::with_capacity(input.len() * 3 / 4);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &c in input {
        let val = digit_value(BASE64URL_ALPHABET, "base64url", c)?;
        buffer = (buffer << 6) | val;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    Ok(out)
}
