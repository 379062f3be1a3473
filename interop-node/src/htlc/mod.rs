//! Hashed time lock contracts
//!
//! The lock contract state machine, its secrets and statuses, and the two
//! plugins that drive deployed lock contracts through web3 connectors:
//! [`HtlcEthPlugin`] (native value, credentials resolved through a keychain)
//! and [`HtlcErc20Plugin`] (ERC-20 tokens, credentials carried by the request).

pub mod contract;
mod plugin_erc20;
mod plugin_eth;
pub mod secret;
pub mod status;

pub use plugin_erc20::{
    Erc20InitializeRequest, Erc20NewContractRequest, Erc20RefundRequest, Erc20StatusRequest,
    Erc20WithdrawRequest, HtlcErc20Plugin,
};
pub use plugin_eth::{
    HtlcEthPlugin, InitializeRequest, KeychainSigner, NewContractRequest, RefundRequest,
    StatusQuery, WithdrawRequest,
};

use chain_clients_common::{Bytes32, EvmAddress};
use chain_clients_evm::{InvokeContractResponse, Web3SigningCredential, Web3SigningCredentialType};
use serde::Serialize;
use serde_json::Value;

use crate::keychain::Keychain;
use crate::plugin::PluginError;
use status::SwapStatus;

/// Result of a `newContract` transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContractResponse {
    /// Swap id the contract derives for the new swap
    pub id: Bytes32,
    #[serde(flatten)]
    pub response: InvokeContractResponse,
}

/// Gas limit of a transaction: the requested one unless absent or zero.
pub fn resolve_gas(requested: Option<u64>, estimated_gas: u64) -> u64 {
    match requested {
        Some(gas) if gas > 0 => gas,
        _ => estimated_gas,
    }
}

/// Builds the signing credential for `credential_type` from keychain references.
///
/// Private-key and keystore credentials look up the account and the secret
/// concurrently. A keychain-ref credential only resolves the account; the
/// connector reads the key from the keychain itself.
pub async fn keychain_credential(
    keychain: &dyn Keychain,
    credential_type: Web3SigningCredentialType,
    account_ref: &str,
    private_key_ref: &str,
) -> Result<Web3SigningCredential, PluginError> {
    Ok(match credential_type {
        Web3SigningCredentialType::None => Web3SigningCredential::None,
        Web3SigningCredentialType::CactusKeychainRef => Web3SigningCredential::CactusKeychainRef {
            eth_account: keychain.get(account_ref).await?,
            keychain_id: keychain.keychain_id().to_string(),
            keychain_entry_key: private_key_ref.to_string(),
        },
        Web3SigningCredentialType::PrivateKeyHex => {
            let (eth_account, secret) =
                futures::try_join!(keychain.get(account_ref), keychain.get(private_key_ref))?;
            Web3SigningCredential::PrivateKeyHex { eth_account, secret }
        }
        Web3SigningCredentialType::GethKeychainPassword => {
            let (eth_account, secret) =
                futures::try_join!(keychain.get(account_ref), keychain.get(private_key_ref))?;
            Web3SigningCredential::GethKeychainPassword { eth_account, secret }
        }
    })
}

pub(crate) fn parse_bytes32(name: &str, value: &str) -> Result<Bytes32, PluginError> {
    value
        .parse()
        .map_err(|e| PluginError::invalid(format!("{} must be 32 bytes of hex: {}", name, e)))
}

pub(crate) fn parse_address(name: &str, value: &str) -> Result<EvmAddress, PluginError> {
    value
        .parse()
        .map_err(|e| PluginError::invalid(format!("{} must be a 20-byte hex address: {}", name, e)))
}

/// The account a credential sends from.
pub(crate) fn sender_of(credential: &Web3SigningCredential) -> Result<EvmAddress, PluginError> {
    let account = credential
        .eth_account()
        .ok_or_else(|| PluginError::invalid("sending a transaction requires a signing credential"))?;
    parse_address("ethAccount", account)
}

fn single_status(value: &Value) -> Result<SwapStatus, PluginError> {
    SwapStatus::from_call_output(value)
        .ok_or_else(|| PluginError::UnexpectedOutput(format!("not a swap status: {}", value)))
}

pub(crate) fn decode_status(response: &InvokeContractResponse) -> Result<SwapStatus, PluginError> {
    let output = response
        .call_output
        .as_ref()
        .ok_or_else(|| PluginError::UnexpectedOutput("call returned no output".to_string()))?;
    single_status(output)
}

pub(crate) fn decode_statuses(response: &InvokeContractResponse) -> Result<Vec<SwapStatus>, PluginError> {
    match response.call_output.as_ref() {
        Some(Value::Array(items)) => items.iter().map(single_status).collect(),
        Some(other) => Err(PluginError::UnexpectedOutput(format!(
            "expected a list of statuses, got {}",
            other
        ))),
        None => Err(PluginError::UnexpectedOutput("call returned no output".to_string())),
    }
}
