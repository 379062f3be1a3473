//! Swap secrets and their hash locks.

use chain_clients_common::{keccak256, Bytes32, HexError};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const SECRET_LENGTH: usize = 32;

/// Hash lock committed to in a swap: `keccak256(secret)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SecretHash(pub Bytes32);

impl SecretHash {
    pub fn as_bytes32(&self) -> &Bytes32 {
        &self.0
    }
}

impl From<Bytes32> for SecretHash {
    fn from(value: Bytes32) -> Self {
        Self(value)
    }
}

impl FromStr for SecretHash {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl fmt::Display for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretHash({})", self.0)
    }
}

impl Serialize for SecretHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Bytes32::deserialize(deserializer).map(Self)
    }
}

/// Pre-image that unlocks a swap.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret([u8; SECRET_LENGTH]);

impl Secret {
    /// Draws a fresh secret from the thread-local CSPRNG.
    pub fn generate() -> Self {
        Self(rand::random())
    }

    pub fn hash(&self) -> SecretHash {
        SecretHash(Bytes32(keccak256(&self.0)))
    }

    pub fn raw_secret(&self) -> &[u8; SECRET_LENGTH] {
        &self.0
    }

    pub fn as_bytes32(&self) -> Bytes32 {
        Bytes32(self.0)
    }

    /// `true` when this secret opens `hash_lock`.
    pub fn unlocks(&self, hash_lock: &SecretHash) -> bool {
        self.hash() == *hash_lock
    }
}

impl From<[u8; SECRET_LENGTH]> for Secret {
    fn from(bytes: [u8; SECRET_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl From<Bytes32> for Secret {
    fn from(value: Bytes32) -> Self {
        Self(value.0)
    }
}

impl FromStr for Secret {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Bytes32>().map(Self::from)
    }
}

impl fmt::LowerHex for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

// Secrets are revealed on-chain by withdraw, but never before; keep them out of logs.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{:x}", self))
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl<'vde> de::Visitor<'vde> for Visitor {
            type Value = Secret;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a hex encoded 32 byte secret")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Secret, E> {
                Secret::from_str(v).map_err(|_| {
                    de::Error::invalid_value(de::Unexpected::Str(v), &"hex encoded 32 bytes")
                })
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}
