//! Raw transaction value type.
//!
//! Graph search results are kept undeserialized. A [`Transaction`] owns the
//! serialized bytes and knows how to hash them into a txid; parsing inputs
//! and outputs is left to the validator.

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::encoding::parse_hex_bytes;

/// An undeserialized transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    raw: Vec<u8>,
}

impl Transaction {
    pub fn new(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    /// Build from a hex-encoded serialized transaction.
    pub fn from_hex(raw_hex: &str) -> Result<Self> {
        Ok(Self::new(parse_hex_bytes(raw_hex, "raw transaction")?))
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn raw_hex(&self) -> String {
        hex::encode(&self.raw)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.raw
    }

    /// Display-order txid of this transaction.
    pub fn txid(&self) -> String {
        compute_txid(&self.raw)
    }
}

/// Double SHA-256 of the serialized transaction, byte-reversed to display order.
pub fn compute_txid(raw: &[u8]) -> String {
    let first = Sha256::digest(raw);
    let mut second = Sha256::digest(first);
    second.reverse();
    hex::encode(second)
}
