//! Encoding utilities for hex and base64.
//!
//! Provides shared encoding/decoding functions used across workspace crates.

use anyhow::{anyhow, Result};

/// Length of a transaction id in bytes.
pub const TXID_LEN: usize = 32;

// =============================================================================
// Hex / Txid
// =============================================================================

/// Parse a hex string to raw bytes.
///
/// # Arguments
/// * `hex_str` - Hex string (with or without 0x prefix)
/// * `context` - Description for error messages
pub fn parse_hex_bytes(hex_str: &str, context: &str) -> Result<Vec<u8>> {
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    hex::decode(hex_str).map_err(|e| anyhow!("Invalid {} hex '{}': {}", context, hex_str, e))
}

/// Check that `txid` is a 32-byte hex transaction id.
pub fn validate_txid(txid: &str) -> Result<()> {
    let bytes = parse_hex_bytes(txid, "txid")?;
    if bytes.len() != TXID_LEN {
        return Err(anyhow!(
            "Invalid txid '{}': expected {} bytes, got {}",
            txid,
            TXID_LEN,
            bytes.len()
        ));
    }
    Ok(())
}

/// Reverse the byte order of a hex txid.
///
/// Wallet code keeps txids in display order; gs++ expects the internal
/// (little-endian) order, so every request goes through this.
///
/// # Examples
///
/// ```
/// use slp_types::encoding::reverse_txid_hex;
///
/// assert_eq!(reverse_txid_hex("0a0b0c").unwrap(), "0c0b0a");
/// ```
pub fn reverse_txid_hex(txid: &str) -> Result<String> {
    let mut bytes = parse_hex_bytes(txid, "txid")?;
    bytes.reverse();
    Ok(hex::encode(bytes))
}

// =============================================================================
// Base64 Encoding/Decoding
// =============================================================================

/// Encode bytes to base64 string.
pub fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 string to bytes with context-aware error message.
pub fn base64_decode(encoded: &str, context: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| anyhow!("Invalid {} base64: {}", context, e))
}
