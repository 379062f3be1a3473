//! Static-type subset of Solidity `abi.encode`.
//!
//! Every static argument occupies one 32-byte word: addresses and unsigned
//! integers are left-padded, `bytes32` is copied as is.

use crate::{Bytes32, EvmAddress};

pub fn address_word(address: &EvmAddress) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

pub fn uint_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn bytes32_word(value: &Bytes32) -> [u8; 32] {
    *value.as_bytes()
}

/// Concatenates words into the `abi.encode` byte string.
pub fn encode_words(words: &[[u8; 32]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 32);
    for word in words {
        out.extend_from_slice(word);
    }
    out
}
