use chain_clients_evm::{
    DeployContractRequest, EthContractInvocationType, InvokeContractRequest,
    InvokeContractResponse, RunTransactionResponse, Web3Connector, Web3SigningCredential,
    Web3SigningCredentialType,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::contract::swap_id;
use super::secret::SecretHash;
use super::status::SwapStatus;
use super::{
    decode_status, decode_statuses, keychain_credential, parse_address, parse_bytes32,
    resolve_gas, sender_of, NewContractResponse,
};
use crate::artifact::ContractArtifact;
use crate::config::HtlcPluginConfig;
use crate::plugin::{instance_id_or_generate, Plugin, PluginAspect, PluginError};
use crate::registry::PluginRegistry;

pub const PACKAGE_NAME: &str = "htlc-eth-besu";

// ============================================================================
// REQUESTS
// ============================================================================

/// Connector and keychain references shared by every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeychainSigner {
    pub connector_id: String,
    pub keychain_id: String,
    /// Keychain key holding the sending account's address
    pub account_ref: String,
    /// Keychain key holding the account's private key (or keystore password)
    pub private_key_ref: String,
    pub credential_type: Web3SigningCredentialType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    #[serde(flatten)]
    pub signer: KeychainSigner,
    #[serde(default)]
    pub gas: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContractRequest {
    pub contract_address: String,
    /// Native value escrowed by the swap
    pub input_amount: u64,
    pub output_amount: u64,
    /// Unix timestamp (seconds) after which the swap can only be refunded
    pub expiration: u64,
    pub hash_lock: String,
    pub receiver: String,
    pub output_network: String,
    pub output_address: String,
    #[serde(flatten)]
    pub signer: KeychainSigner,
    #[serde(default)]
    pub gas: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub contract_address: String,
    #[serde(flatten)]
    pub signer: KeychainSigner,
    #[serde(default)]
    pub gas: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub id: String,
    pub secret: String,
    pub contract_address: String,
    #[serde(flatten)]
    pub signer: KeychainSigner,
    #[serde(default)]
    pub gas: Option<u64>,
}

/// Parameters of the status queries (sent as a query string).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub contract_address: String,
    pub connector_id: String,
    pub keychain_id: String,
    pub account_ref: String,
    pub private_key_ref: String,
    pub credential_type: Web3SigningCredentialType,
}

impl StatusQuery {
    fn signer(&self) -> KeychainSigner {
        KeychainSigner {
            connector_id: self.connector_id.clone(),
            keychain_id: self.keychain_id.clone(),
            account_ref: self.account_ref.clone(),
            private_key_ref: self.private_key_ref.clone(),
            credential_type: self.credential_type,
        }
    }
}

// ============================================================================
// PLUGIN
// ============================================================================

/// Drives the native-value lock contract, resolving signing credentials
/// through keychains.
pub struct HtlcEthPlugin {
    instance_id: String,
    registry: Arc<PluginRegistry>,
    artifact: ContractArtifact,
    estimated_gas: u64,
}

impl HtlcEthPlugin {
    /// Creates the plugin.
    ///
    /// # Arguments
    ///
    /// * `instance_id` - Non-blank plugin instance id
    /// * `registry` - Registry the connectors and keychains are looked up in
    /// * `artifact` - Lock contract ABI, plus bytecode when `initialize` is needed
    /// * `estimated_gas` - Gas limit of requests that carry none
    pub fn new(
        instance_id: &str,
        registry: Arc<PluginRegistry>,
        artifact: ContractArtifact,
        estimated_gas: u64,
    ) -> Result<Self, PluginError> {
        if instance_id.trim().is_empty() {
            return Err(PluginError::invalid("instanceId must not be blank"));
        }
        Ok(Self {
            instance_id: instance_id.to_string(),
            registry,
            artifact,
            estimated_gas,
        })
    }

    pub fn from_config(config: &HtlcPluginConfig, registry: Arc<PluginRegistry>) -> anyhow::Result<Self> {
        let instance_id = instance_id_or_generate(config.instance_id.as_deref())?;
        let artifact = ContractArtifact::load_or(config.artifact_path.as_deref(), ContractArtifact::hash_time_lock)?;
        Ok(Self::new(&instance_id, registry, artifact, config.estimated_gas)?)
    }

    pub fn estimated_gas(&self) -> u64 {
        self.estimated_gas
    }

    async fn resolve(
        &self,
        signer: &KeychainSigner,
    ) -> Result<(Arc<dyn Web3Connector>, Web3SigningCredential), PluginError> {
        let connector = self.registry.find_web3_connector(&signer.connector_id)?;
        let keychain = self.registry.find_keychain(&signer.keychain_id)?;
        let credential = keychain_credential(
            keychain.as_ref(),
            signer.credential_type,
            &signer.account_ref,
            &signer.private_key_ref,
        )
        .await?;
        Ok((connector, credential))
    }

    fn invoke_request(
        &self,
        contract_address: &str,
        invocation_type: EthContractInvocationType,
        method_name: &str,
        params: Vec<Value>,
        credential: Web3SigningCredential,
        gas: Option<u64>,
    ) -> InvokeContractRequest {
        InvokeContractRequest {
            contract_abi: self.artifact.abi.clone(),
            contract_address: contract_address.to_string(),
            invocation_type,
            method_name: method_name.to_string(),
            params,
            web3_signing_credential: credential,
            gas,
            gas_price: None,
            value: None,
            timeout_ms: None,
        }
    }

    /// Deploys the lock contract; the receipt carries its address.
    pub async fn initialize(&self, request: InitializeRequest) -> Result<RunTransactionResponse, PluginError> {
        if !self.artifact.has_bytecode() {
            return Err(PluginError::NotConfigured(
                "lock contract bytecode is not available; configure htlc.artifact_path".to_string(),
            ));
        }
        let (connector, credential) = self.resolve(&request.signer).await?;
        let gas = resolve_gas(request.gas, self.estimated_gas);

        info!("Deploying HashTimeLock through connector '{}'", request.signer.connector_id);
        let response = connector
            .deploy_contract(DeployContractRequest {
                bytecode: self.artifact.bytecode.clone(),
                web3_signing_credential: credential,
                gas: Some(gas),
                gas_price: None,
                constructor_args: vec![],
                timeout_ms: None,
            })
            .await?;
        info!(
            "HashTimeLock deployed at {:?}",
            response.transaction_receipt.contract_address
        );
        Ok(response)
    }

    /// Creates a swap escrowing `inputAmount` of native value.
    pub async fn new_contract(&self, request: NewContractRequest) -> Result<NewContractResponse, PluginError> {
        parse_address("contractAddress", &request.contract_address)?;
        let hash_lock = SecretHash(parse_bytes32("hashLock", &request.hash_lock)?);
        let receiver = parse_address("receiver", &request.receiver)?;

        let (connector, credential) = self.resolve(&request.signer).await?;
        let sender = sender_of(&credential)?;
        let id = swap_id(&sender, &receiver, request.input_amount, &hash_lock, request.expiration);

        let params = vec![
            json!(request.output_amount),
            json!(request.expiration),
            json!(hash_lock),
            json!(receiver),
            json!(request.output_network),
            json!(request.output_address),
        ];
        let mut invoke = self.invoke_request(
            &request.contract_address,
            EthContractInvocationType::Send,
            "newContract",
            params,
            credential,
            Some(resolve_gas(request.gas, self.estimated_gas)),
        );
        invoke.value = Some(request.input_amount);

        debug!("newContract {} on {}", id, request.contract_address);
        let response = connector.invoke_contract(invoke).await?;
        Ok(NewContractResponse { id, response })
    }

    /// Refunds swap `id` to its sender after expiration.
    pub async fn refund(&self, id: &str, request: RefundRequest) -> Result<InvokeContractResponse, PluginError> {
        let id = parse_bytes32("id", id)?;
        parse_address("contractAddress", &request.contract_address)?;

        let (connector, credential) = self.resolve(&request.signer).await?;
        debug!("refund {} on {}", id, request.contract_address);
        Ok(connector
            .invoke_contract(self.invoke_request(
                &request.contract_address,
                EthContractInvocationType::Send,
                "refund",
                vec![json!(id)],
                credential,
                Some(resolve_gas(request.gas, self.estimated_gas)),
            ))
            .await?)
    }

    /// Releases swap `id` to its receiver by revealing the secret.
    pub async fn withdraw(&self, request: WithdrawRequest) -> Result<InvokeContractResponse, PluginError> {
        let id = parse_bytes32("id", &request.id)?;
        let secret = parse_bytes32("secret", &request.secret)?;
        parse_address("contractAddress", &request.contract_address)?;

        let (connector, credential) = self.resolve(&request.signer).await?;
        debug!("withdraw {} on {}", id, request.contract_address);
        Ok(connector
            .invoke_contract(self.invoke_request(
                &request.contract_address,
                EthContractInvocationType::Send,
                "withdraw",
                vec![json!(id), json!(secret)],
                credential,
                Some(resolve_gas(request.gas, self.estimated_gas)),
            ))
            .await?)
    }

    /// Statuses of `ids`, in order.
    pub async fn get_status(&self, ids: &[String], query: StatusQuery) -> Result<Vec<SwapStatus>, PluginError> {
        let ids = ids
            .iter()
            .map(|id| parse_bytes32("ids", id))
            .collect::<Result<Vec<_>, _>>()?;
        parse_address("contractAddress", &query.contract_address)?;

        let (connector, credential) = self.resolve(&query.signer()).await?;
        let response = connector
            .invoke_contract(self.invoke_request(
                &query.contract_address,
                EthContractInvocationType::Call,
                "getStatus",
                vec![json!(ids)],
                credential,
                None,
            ))
            .await?;
        decode_statuses(&response)
    }

    pub async fn get_single_status(&self, id: &str, query: StatusQuery) -> Result<SwapStatus, PluginError> {
        let id = parse_bytes32("id", id)?;
        parse_address("contractAddress", &query.contract_address)?;

        let (connector, credential) = self.resolve(&query.signer()).await?;
        let response = connector
            .invoke_contract(self.invoke_request(
                &query.contract_address,
                EthContractInvocationType::Call,
                "getSingleStatus",
                vec![json!(id)],
                credential,
                None,
            ))
            .await?;
        decode_status(&response)
    }
}

impl Plugin for HtlcEthPlugin {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn package_name(&self) -> &'static str {
        PACKAGE_NAME
    }

    fn aspect(&self) -> PluginAspect {
        PluginAspect::Htlc
    }
}
