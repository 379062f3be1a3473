//! Compiled contract artifacts (ABI + deployment bytecode).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const HASH_TIME_LOCK_ABI: &str = include_str!("../contracts/HashTimeLock.abi.json");
const TOKEN_HASH_TIME_LOCK_ABI: &str =
    include_str!("../contracts/HashedTimeLockContract.abi.json");
const BOOKSHELF_REPOSITORY_ABI: &str = include_str!("../contracts/BookshelfRepository.abi.json");
const BAMBOO_HARVEST_REPOSITORY_ABI: &str =
    include_str!("../contracts/BambooHarvestRepository.abi.json");

/// Contract ABI and bytecode, in the layout solc/truffle build output uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractArtifact {
    pub abi: serde_json::Value,
    /// Deployment bytecode; empty when only the ABI is known
    #[serde(default)]
    pub bytecode: String,
}

impl ContractArtifact {
    /// Reads an artifact JSON file (`{"abi": [...], "bytecode": "0x..."}`).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read contract artifact {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse contract artifact {}", path.display()))
    }

    /// Loads `path` when given, otherwise falls back to `embedded`.
    pub fn load_or(path: Option<&str>, embedded: fn() -> Self) -> Result<Self> {
        match path {
            Some(path) => Self::load(Path::new(path)),
            None => Ok(embedded()),
        }
    }

    /// ABI of the native-value lock contract, without bytecode.
    pub fn hash_time_lock() -> Self {
        Self::abi_only(HASH_TIME_LOCK_ABI)
    }

    /// ABI of the ERC-20 lock contract, without bytecode.
    pub fn token_hash_time_lock() -> Self {
        Self::abi_only(TOKEN_HASH_TIME_LOCK_ABI)
    }

    pub fn bookshelf_repository() -> Self {
        Self::abi_only(BOOKSHELF_REPOSITORY_ABI)
    }

    pub fn bamboo_harvest_repository() -> Self {
        Self::abi_only(BAMBOO_HARVEST_REPOSITORY_ABI)
    }

    pub fn with_bytecode(mut self, bytecode: &str) -> Self {
        self.bytecode = bytecode.to_string();
        self
    }

    pub fn has_bytecode(&self) -> bool {
        !chain_clients_common::strip_hex_prefix(self.bytecode.trim()).is_empty()
    }

    fn abi_only(abi: &str) -> Self {
        Self {
            // embedded files are covered by tests
            abi: serde_json::from_str(abi).unwrap_or(serde_json::Value::Array(vec![])),
            bytecode: String::new(),
        }
    }
}
