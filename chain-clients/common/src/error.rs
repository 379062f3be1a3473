use thiserror::Error;

/// Errors raised while parsing hex-encoded fixed-size values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("invalid hex string: '{0}'")]
    InvalidHex(String),
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// Errors surfaced by any ledger connector, remote or in-process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    /// The connector could not be reached.
    #[error("connector transport error: {0}")]
    Transport(String),
    /// The connector answered with a non-success HTTP status.
    #[error("connector returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The connector answered with a body that could not be decoded.
    #[error("failed to decode connector response: {0}")]
    Decode(String),
    /// The ledger rejected the transaction (contract revert).
    #[error("transaction reverted: {0}")]
    Reverted(String),
    /// The request was refused before reaching the ledger.
    #[error("request rejected: {0}")]
    Rejected(String),
}
