//! Supply-chain business-logic plugin
//!
//! Tracks bamboo harvests (Quorum), the bookshelves built from them (Besu) and
//! their shipments (Fabric). Every operation is a single pass-through call to
//! the configured connector.

mod records;

pub use records::{BambooHarvest, Bookshelf, RepositoryRecord, Shipment};

use chain_clients_evm::{
    EthContractInvocationType, InvokeContractRequest, InvokeContractResponse, Web3SigningCredential,
};
use chain_clients_fabric::{FabricContractInvocationType, RunTransactionRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::artifact::ContractArtifact;
use crate::config::{SupplyChainConfig, Web3ContractConfig};
use crate::plugin::{instance_id_or_generate, Plugin, PluginAspect, PluginError};
use crate::registry::PluginRegistry;

pub const PACKAGE_NAME: &str = "supply-chain";

/// Result of `insertShipment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertShipmentResponse {
    pub function_output: String,
}

/// A repository contract together with the ABI used to call it.
struct Repository {
    config: Web3ContractConfig,
    abi: Value,
}

impl Repository {
    fn load(config: &Web3ContractConfig, embedded: fn() -> ContractArtifact) -> anyhow::Result<Self> {
        let artifact = ContractArtifact::load_or(config.artifact_path.as_deref(), embedded)?;
        Ok(Self {
            config: config.clone(),
            abi: artifact.abi,
        })
    }

    fn request(
        &self,
        invocation_type: EthContractInvocationType,
        method_name: &str,
        params: Vec<Value>,
        credential: Web3SigningCredential,
    ) -> InvokeContractRequest {
        InvokeContractRequest {
            contract_abi: self.abi.clone(),
            contract_address: self.config.contract_address.clone(),
            invocation_type,
            method_name: method_name.to_string(),
            params,
            web3_signing_credential: credential,
            gas: None,
            gas_price: None,
            value: None,
            timeout_ms: None,
        }
    }

    fn signer(&self) -> Web3SigningCredential {
        Web3SigningCredential::CactusKeychainRef {
            eth_account: self.config.eth_account.clone(),
            keychain_id: self.config.keychain_id.clone(),
            keychain_entry_key: self.config.keychain_entry_key.clone(),
        }
    }
}

pub struct SupplyChainPlugin {
    instance_id: String,
    registry: Arc<PluginRegistry>,
    config: SupplyChainConfig,
    bookshelves: Repository,
    bamboo_harvests: Repository,
}

impl SupplyChainPlugin {
    pub fn from_config(config: &SupplyChainConfig, registry: Arc<PluginRegistry>) -> anyhow::Result<Self> {
        let instance_id = instance_id_or_generate(config.instance_id.as_deref())?;
        Ok(Self {
            instance_id,
            registry,
            config: config.clone(),
            bookshelves: Repository::load(&config.bookshelf, ContractArtifact::bookshelf_repository)?,
            bamboo_harvests: Repository::load(
                &config.bamboo_harvest,
                ContractArtifact::bamboo_harvest_repository,
            )?,
        })
    }

    fn fabric_request(
        &self,
        invocation_type: FabricContractInvocationType,
        function_name: &str,
        function_args: Vec<String>,
    ) -> RunTransactionRequest {
        let shipment = &self.config.shipment;
        RunTransactionRequest {
            keychain_id: shipment.keychain_id.clone(),
            keychain_ref: shipment.keychain_ref.clone(),
            channel_name: shipment.channel_name.clone(),
            chain_code_id: shipment.chain_code_id.clone(),
            invocation_type,
            function_name: function_name.to_string(),
            function_args,
        }
    }

    pub async fn insert_shipment(&self, shipment: Shipment) -> Result<InsertShipmentResponse, PluginError> {
        require_id(&shipment.id)?;
        let connector = self
            .registry
            .find_fabric_connector(&self.config.shipment.connector_id)?;

        debug!("insertShipment {:?}", shipment);
        let response = connector
            .run_transaction(self.fabric_request(
                FabricContractInvocationType::Send,
                "insertShipment",
                vec![shipment.id, shipment.bookshelf_id],
            ))
            .await?;
        Ok(InsertShipmentResponse {
            function_output: response.function_output,
        })
    }

    /// All shipments; the chaincode returns them as a JSON document.
    pub async fn list_shipment(&self) -> Result<Vec<Shipment>, PluginError> {
        let connector = self
            .registry
            .find_fabric_connector(&self.config.shipment.connector_id)?;
        let response = connector
            .run_transaction(self.fabric_request(FabricContractInvocationType::Call, "getListShipment", vec![]))
            .await?;
        if response.function_output.trim().is_empty() {
            return Ok(vec![]);
        }
        serde_json::from_str(&response.function_output)
            .map_err(|e| PluginError::UnexpectedOutput(format!("getListShipment: {}", e)))
    }

    pub async fn insert_bookshelf(&self, bookshelf: Bookshelf) -> Result<InvokeContractResponse, PluginError> {
        self.insert_record(&self.bookshelves, &bookshelf).await
    }

    pub async fn list_bookshelf(&self) -> Result<Vec<Bookshelf>, PluginError> {
        self.list_records(&self.bookshelves).await
    }

    pub async fn insert_bamboo_harvest(
        &self,
        bamboo_harvest: BambooHarvest,
    ) -> Result<InvokeContractResponse, PluginError> {
        self.insert_record(&self.bamboo_harvests, &bamboo_harvest).await
    }

    pub async fn list_bamboo_harvest(&self) -> Result<Vec<BambooHarvest>, PluginError> {
        self.list_records(&self.bamboo_harvests).await
    }

    async fn insert_record<R: RepositoryRecord + std::fmt::Debug + Sync>(
        &self,
        repository: &Repository,
        record: &R,
    ) -> Result<InvokeContractResponse, PluginError> {
        require_id(record.id())?;
        let connector = self.registry.find_web3_connector(&repository.config.connector_id)?;

        debug!("insert {} {:?}", R::KIND, record);
        Ok(connector
            .invoke_contract(repository.request(
                EthContractInvocationType::Send,
                "insertRecord",
                vec![record.to_tuple()],
                repository.signer(),
            ))
            .await?)
    }

    async fn list_records<R: RepositoryRecord>(&self, repository: &Repository) -> Result<Vec<R>, PluginError> {
        let connector = self.registry.find_web3_connector(&repository.config.connector_id)?;
        let response = connector
            .invoke_contract(repository.request(
                EthContractInvocationType::Call,
                "getAllRecords",
                vec![],
                Web3SigningCredential::None,
            ))
            .await?;

        match response.call_output {
            None | Some(Value::Null) => Ok(vec![]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    R::from_output(item).ok_or_else(|| {
                        PluginError::UnexpectedOutput(format!("not a {} record: {}", R::KIND, item))
                    })
                })
                .collect(),
            Some(other) => Err(PluginError::UnexpectedOutput(format!(
                "getAllRecords returned {}",
                other
            ))),
        }
    }
}

fn require_id(id: &str) -> Result<(), PluginError> {
    if id.trim().is_empty() {
        return Err(PluginError::invalid("id must not be blank"));
    }
    Ok(())
}

impl Plugin for SupplyChainPlugin {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn package_name(&self) -> &'static str {
        PACKAGE_NAME
    }

    fn aspect(&self) -> PluginAspect {
        PluginAspect::BusinessLogic
    }
}
