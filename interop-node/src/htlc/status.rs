use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Lifecycle state of a swap as reported by the lock contract.
///
/// Serialized as its numeric code, which is what the contract returns.
/// `Expired` is never stored on-chain; it is derived at query time for an
/// active swap whose expiration has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapStatus {
    Invalid = 0,
    Active = 1,
    Refunded = 2,
    Withdrawn = 3,
    Expired = 4,
}

impl SwapStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Invalid),
            1 => Some(Self::Active),
            2 => Some(Self::Refunded),
            3 => Some(Self::Withdrawn),
            4 => Some(Self::Expired),
            _ => None,
        }
    }

    /// Reads a status out of a connector call output.
    ///
    /// Web3 connectors return `uint8` outputs either as JSON numbers or as
    /// decimal strings.
    pub fn from_call_output(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_u64().and_then(Self::from_code),
            serde_json::Value::String(s) => s.trim().parse::<u64>().ok().and_then(Self::from_code),
            _ => None,
        }
    }

    /// `Withdrawn` and `Refunded` can never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Withdrawn | Self::Refunded)
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invalid => "INVALID",
            Self::Active => "ACTIVE",
            Self::Refunded => "REFUNDED",
            Self::Withdrawn => "WITHDRAWN",
            Self::Expired => "EXPIRED",
        };
        f.write_str(name)
    }
}

impl Serialize for SwapStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for SwapStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u64::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown swap status code {}", code)))
    }
}
