//! Config compression for URL transport.
//!
//! The compressed form rides inside a query parameter, so it must be
//! URL-safe text and as short as possible: JSON, DEFLATE, then unpadded
//! base64url.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::codec::base::{base64url_decode, base64url_encode};
use crate::config::schema::GatewayConfig;
use crate::sync::bus::SyncError;

/// Serialize and compress `config` into URL-safe text.
pub fn compress_config(config: &GatewayConfig) -> Result<String, SyncError> {
    let json = serde_json::to_vec(config).map_err(|e| SyncError::Payload(e.to_string()))?;

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(&json)
        .map_err(|e| SyncError::Payload(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| SyncError::Payload(e.to_string()))?;

    Ok(base64url_encode(&compressed))
}

/// Exact inverse of [`compress_config`].
pub fn decompress_config(text: &str) -> Result<GatewayConfig, SyncError> {
    let compressed = base64url_decode(text).map_err(|e| SyncError::Payload(e.to_string()))?;

    let mut json = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .read_to_end(&mut json)
        .map_err(|e| SyncError::Payload(e.to_string()))?;

    serde_json::from_slice(&json).map_err(|e| SyncError::Payload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_default_config() {
        let config = GatewayConfig::default();
        let compressed = compress_config(&config).unwrap();
        assert_eq!(decompress_config(&compressed).unwrap(), config);
    }

    #[test]
    fn test_payload_is_url_safe() {
        let mut config = GatewayConfig::default();
        config.gateways.push("https://gateway.example/path?query=1&other=2".to_string());
        config.debug = "gw:*,trace stuff with spaces".to_string();

        let compressed = compress_config(&config).unwrap();
        assert!(compressed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(decompress_config(&compressed).unwrap(), config);
    }

    #[test]
    fn test_garbage_payload_is_an_error_not_a_panic() {
        assert!(decompress_config("!!!").is_err());
        assert!(decompress_config("aaaa").is_err());
        assert!(decompress_config("").is_err());
    }
}
