//! Keychains
//!
//! A keychain resolves named references (account refs, private key refs) to
//! their secret values. Plugins never hold keys themselves; they look them up
//! per request through the keychain named in the request.

mod memory;
mod remote;

pub use memory::MemoryKeychain;
pub use remote::RemoteKeychain;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeychainError {
    #[error("keychain {keychain_id} has no entry for key '{key}'")]
    KeyNotFound { keychain_id: String, key: String },
    #[error("keychain transport error: {0}")]
    Transport(String),
    #[error("keychain returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode keychain response: {0}")]
    Decode(String),
}

/// Key/value store of secrets addressed by keychain id.
#[async_trait]
pub trait Keychain: Send + Sync {
    /// Id that requests use to select this keychain.
    fn keychain_id(&self) -> &str;

    /// Id of the keychain plugin instance.
    fn instance_id(&self) -> &str;

    /// Returns the value stored under `key`; a missing key is an error.
    async fn get(&self, key: &str) -> Result<String, KeychainError>;

    async fn has(&self, key: &str) -> Result<bool, KeychainError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), KeychainError>;

    async fn delete(&self, key: &str) -> Result<(), KeychainError>;
}
