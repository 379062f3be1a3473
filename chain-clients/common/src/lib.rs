//! Shared utilities for ledger connector clients
//!
//! Fixed-size EVM values (addresses, 32-byte words), keccak256 hashing and the
//! static-type subset of Solidity `abi.encode` used to derive swap ids.

pub mod abi;
mod error;
mod types;

pub use error::{ConnectorError, HexError};
pub use types::{Bytes32, EvmAddress};

use sha3::{Digest, Keccak256};

/// Computes keccak256 over the given bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Normalizes a hex string to lowercase with a `0x` prefix.
///
/// Does not validate the digits; use [`decode_hex`] for that.
pub fn normalize_hex(value: &str) -> String {
    let trimmed = value.trim();
    let stripped = strip_hex_prefix(trimmed);
    format!("0x{}", stripped.to_ascii_lowercase())
}

/// Removes a leading `0x`/`0X` if present.
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Decodes a hex string with or without `0x` prefix.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, HexError> {
    hex::decode(strip_hex_prefix(value.trim())).map_err(|_| HexError::InvalidHex(value.to_string()))
}
