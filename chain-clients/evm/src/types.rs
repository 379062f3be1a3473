//! Request/response types of the web3 ledger connector REST surface.
//!
//! Field names follow the connector's JSON (camelCase).

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SIGNING CREDENTIALS
// ============================================================================

/// Credential the connector signs a transaction with.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Web3SigningCredential {
    /// Raw hex private key for `eth_account`
    #[serde(rename = "PRIVATE_KEY_HEX", rename_all = "camelCase")]
    PrivateKeyHex { eth_account: String, secret: String },
    /// Private key held by a keychain the connector itself can reach
    #[serde(rename = "CACTUS_KEYCHAIN_REF", rename_all = "camelCase")]
    CactusKeychainRef {
        eth_account: String,
        keychain_id: String,
        keychain_entry_key: String,
    },
    /// Account unlocked in the node's own keystore with a password
    #[serde(rename = "GETH_KEYCHAIN_PASSWORD", rename_all = "camelCase")]
    GethKeychainPassword { eth_account: String, secret: String },
    /// No signing (read-only calls)
    #[serde(rename = "NONE")]
    None,
}

impl Web3SigningCredential {
    pub fn eth_account(&self) -> Option<&str> {
        match self {
            Self::PrivateKeyHex { eth_account, .. }
            | Self::CactusKeychainRef { eth_account, .. }
            | Self::GethKeychainPassword { eth_account, .. } => Some(eth_account),
            Self::None => None,
        }
    }

    pub fn credential_type(&self) -> Web3SigningCredentialType {
        match self {
            Self::PrivateKeyHex { .. } => Web3SigningCredentialType::PrivateKeyHex,
            Self::CactusKeychainRef { .. } => Web3SigningCredentialType::CactusKeychainRef,
            Self::GethKeychainPassword { .. } => Web3SigningCredentialType::GethKeychainPassword,
            Self::None => Web3SigningCredentialType::None,
        }
    }
}

// Secrets never reach logs.
impl fmt::Debug for Web3SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrivateKeyHex { eth_account, .. } => f
                .debug_struct("PrivateKeyHex")
                .field("eth_account", eth_account)
                .field("secret", &"<redacted>")
                .finish(),
            Self::CactusKeychainRef {
                eth_account,
                keychain_id,
                keychain_entry_key,
            } => f
                .debug_struct("CactusKeychainRef")
                .field("eth_account", eth_account)
                .field("keychain_id", keychain_id)
                .field("keychain_entry_key", keychain_entry_key)
                .finish(),
            Self::GethKeychainPassword { eth_account, .. } => f
                .debug_struct("GethKeychainPassword")
                .field("eth_account", eth_account)
                .field("secret", &"<redacted>")
                .finish(),
            Self::None => f.write_str("None"),
        }
    }
}

/// Discriminant of [`Web3SigningCredential`], used where the credential itself
/// is assembled from keychain references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Web3SigningCredentialType {
    #[serde(rename = "PRIVATE_KEY_HEX")]
    PrivateKeyHex,
    #[serde(rename = "CACTUS_KEYCHAIN_REF")]
    CactusKeychainRef,
    #[serde(rename = "GETH_KEYCHAIN_PASSWORD")]
    GethKeychainPassword,
    #[serde(rename = "NONE")]
    None,
}

impl std::str::FromStr for Web3SigningCredentialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIVATE_KEY_HEX" => Ok(Self::PrivateKeyHex),
            "CACTUS_KEYCHAIN_REF" => Ok(Self::CactusKeychainRef),
            "GETH_KEYCHAIN_PASSWORD" => Ok(Self::GethKeychainPassword),
            "NONE" => Ok(Self::None),
            other => Err(format!("unknown credential type: {}", other)),
        }
    }
}

// ============================================================================
// CONTRACT DEPLOYMENT AND INVOCATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EthContractInvocationType {
    /// State-changing transaction
    Send,
    /// Read-only call
    Call,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployContractRequest {
    pub bytecode: String,
    pub web3_signing_credential: Web3SigningCredential,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constructor_args: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeContractRequest {
    pub contract_abi: serde_json::Value,
    pub contract_address: String,
    pub invocation_type: EthContractInvocationType,
    pub method_name: String,
    pub params: Vec<serde_json::Value>,
    pub web3_signing_credential: Web3SigningCredential,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    /// Native value (wei) sent with the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub gas_used: u64,
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTransactionResponse {
    pub transaction_receipt: TransactionReceipt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeContractResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_receipt: Option<TransactionReceipt>,
}
