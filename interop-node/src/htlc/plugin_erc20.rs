use chain_clients_evm::{
    DeployContractRequest, EthContractInvocationType, InvokeContractRequest,
    InvokeContractResponse, RunTransactionResponse, Web3SigningCredential,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::contract::token_swap_id;
use super::secret::SecretHash;
use super::status::SwapStatus;
use super::{
    decode_status, decode_statuses, parse_address, parse_bytes32, resolve_gas, sender_of,
    NewContractResponse,
};
use crate::artifact::ContractArtifact;
use crate::config::HtlcPluginConfig;
use crate::plugin::{instance_id_or_generate, Plugin, PluginAspect, PluginError};
use crate::registry::PluginRegistry;

pub const PACKAGE_NAME: &str = "htlc-eth-besu-erc20";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc20InitializeRequest {
    pub connector_id: String,
    pub web3_signing_credential: Web3SigningCredential,
    #[serde(default)]
    pub gas: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc20NewContractRequest {
    pub contract_address: String,
    /// Token amount escrowed; the lock contract needs an allowance for it
    pub input_amount: u64,
    pub output_amount: u64,
    pub expiration: u64,
    pub hash_lock: String,
    pub token_address: String,
    pub receiver: String,
    pub output_network: String,
    pub output_address: String,
    pub connector_id: String,
    pub web3_signing_credential: Web3SigningCredential,
    #[serde(default)]
    pub gas: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc20RefundRequest {
    pub id: String,
    pub contract_address: String,
    pub connector_id: String,
    pub web3_signing_credential: Web3SigningCredential,
    #[serde(default)]
    pub gas: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc20WithdrawRequest {
    pub id: String,
    pub secret: String,
    pub contract_address: String,
    pub connector_id: String,
    pub web3_signing_credential: Web3SigningCredential,
    #[serde(default)]
    pub gas: Option<u64>,
}

/// Body of `get-status` (`ids`) and `get-single-status` (`id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc20StatusRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ids: Vec<String>,
    pub contract_address: String,
    pub connector_id: String,
    pub web3_signing_credential: Web3SigningCredential,
}

/// Drives the ERC-20 lock contract with credentials supplied per request.
pub struct HtlcErc20Plugin {
    instance_id: String,
    registry: Arc<PluginRegistry>,
    artifact: ContractArtifact,
    estimated_gas: u64,
}

impl HtlcErc20Plugin {
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
        let artifact = ContractArtifact::load_or(
            config.artifact_path.as_deref(),
            ContractArtifact::token_hash_time_lock,
        )?;
        Ok(Self::new(&instance_id, registry, artifact, config.estimated_gas)?)
    }

    #[allow(clippy::too_many_arguments)]
    async fn invoke(
        &self,
        connector_id: &str,
        contract_address: &str,
        invocation_type: EthContractInvocationType,
        method_name: &str,
        params: Vec<Value>,
        credential: Web3SigningCredential,
        gas: Option<u64>,
    ) -> Result<InvokeContractResponse, PluginError> {
        parse_address("contractAddress", contract_address)?;
        let connector = self.registry.find_web3_connector(connector_id)?;
        debug!("{} {} on {}", method_name, contract_address, connector_id);
        Ok(connector
            .invoke_contract(InvokeContractRequest {
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
            })
            .await?)
    }

    pub async fn initialize(&self, request: Erc20InitializeRequest) -> Result<RunTransactionResponse, PluginError> {
        if !self.artifact.has_bytecode() {
            return Err(PluginError::NotConfigured(
                "token lock contract bytecode is not available; configure htlc_erc20.artifact_path"
                    .to_string(),
            ));
        }
        let connector = self.registry.find_web3_connector(&request.connector_id)?;

        info!("Deploying HashedTimeLockContract through connector '{}'", request.connector_id);
        Ok(connector
            .deploy_contract(DeployContractRequest {
                bytecode: self.artifact.bytecode.clone(),
                web3_signing_credential: request.web3_signing_credential,
                gas: Some(resolve_gas(request.gas, self.estimated_gas)),
                gas_price: None,
                constructor_args: vec![],
                timeout_ms: None,
            })
            .await?)
    }

    /// Creates a swap escrowing `inputAmount` of `tokenAddress`.
    pub async fn new_contract(&self, request: Erc20NewContractRequest) -> Result<NewContractResponse, PluginError> {
        let hash_lock = SecretHash(parse_bytes32("hashLock", &request.hash_lock)?);
        let token_address = parse_address("tokenAddress", &request.token_address)?;
        let receiver = parse_address("receiver", &request.receiver)?;
        let sender = sender_of(&request.web3_signing_credential)?;
        let id = token_swap_id(
            &sender,
            &receiver,
            request.input_amount,
            &hash_lock,
            request.expiration,
            &token_address,
        );

        let params = vec![
            json!(request.input_amount),
            json!(request.output_amount),
            json!(request.expiration),
            json!(hash_lock),
            json!(token_address),
            json!(receiver),
            json!(request.output_network),
            json!(request.output_address),
        ];
        let response = self
            .invoke(
                &request.connector_id,
                &request.contract_address,
                EthContractInvocationType::Send,
                "newContract",
                params,
                request.web3_signing_credential,
                Some(resolve_gas(request.gas, self.estimated_gas)),
            )
            .await?;
        Ok(NewContractResponse { id, response })
    }

    pub async fn refund(&self, request: Erc20RefundRequest) -> Result<InvokeContractResponse, PluginError> {
        let id = parse_bytes32("id", &request.id)?;
        self.invoke(
            &request.connector_id,
            &request.contract_address,
            EthContractInvocationType::Send,
            "refund",
            vec![json!(id)],
            request.web3_signing_credential,
            Some(resolve_gas(request.gas, self.estimated_gas)),
        )
        .await
    }

    pub async fn withdraw(&self, request: Erc20WithdrawRequest) -> Result<InvokeContractResponse, PluginError> {
        let id = parse_bytes32("id", &request.id)?;
        let secret = parse_bytes32("secret", &request.secret)?;
        self.invoke(
            &request.connector_id,
            &request.contract_address,
            EthContractInvocationType::Send,
            "withdraw",
            vec![json!(id), json!(secret)],
            request.web3_signing_credential,
            Some(resolve_gas(request.gas, self.estimated_gas)),
        )
        .await
    }

    pub async fn get_status(&self, request: Erc20StatusRequest) -> Result<Vec<SwapStatus>, PluginError> {
        let ids = request
            .ids
            .iter()
            .map(|id| parse_bytes32("ids", id))
            .collect::<Result<Vec<_>, _>>()?;
        let response = self
            .invoke(
                &request.connector_id,
                &request.contract_address,
                EthContractInvocationType::Call,
                "getStatus",
                vec![json!(ids)],
                request.web3_signing_credential,
                None,
            )
            .await?;
        decode_statuses(&response)
    }

    pub async fn get_single_status(&self, request: Erc20StatusRequest) -> Result<SwapStatus, PluginError> {
        let id = request
            .id
            .as_deref()
            .ok_or_else(|| PluginError::invalid("id is required"))?;
        let id = parse_bytes32("id", id)?;
        let response = self
            .invoke(
                &request.connector_id,
                &request.contract_address,
                EthContractInvocationType::Call,
                "getSingleStatus",
                vec![json!(id)],
                request.web3_signing_credential,
                None,
            )
            .await?;
        decode_status(&response)
    }
}

impl Plugin for HtlcErc20Plugin {
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
