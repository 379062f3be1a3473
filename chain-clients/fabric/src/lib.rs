//! Fabric ledger connector client
//!
//! Submits and evaluates chaincode transactions through a remote Fabric
//! connector service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub use chain_clients_common::ConnectorError;

const RUN_TRANSACTION_PATH: &str =
    "/api/v1/plugins/@hyperledger/cactus-plugin-ledger-connector-fabric/run-transaction";

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FabricContractInvocationType {
    /// Submit a transaction for ordering
    #[serde(rename = "FabricContractInvocationType.SEND")]
    Send,
    /// Evaluate against a peer without ordering
    #[serde(rename = "FabricContractInvocationType.CALL")]
    Call,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTransactionRequest {
    /// Keychain holding the identity the connector signs with
    pub keychain_id: String,
    pub keychain_ref: String,
    pub channel_name: String,
    pub chain_code_id: String,
    pub invocation_type: FabricContractInvocationType,
    pub function_name: String,
    pub function_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTransactionResponse {
    /// Raw chaincode return value (often a JSON document)
    pub function_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

// ============================================================================
// CONNECTOR
// ============================================================================

/// A connector able to run Fabric chaincode transactions.
#[async_trait]
pub trait FabricConnector: Send + Sync {
    fn instance_id(&self) -> &str;

    async fn run_transaction(
        &self,
        request: RunTransactionRequest,
    ) -> Result<RunTransactionResponse, ConnectorError>;
}

/// Client for a Fabric connector reachable over HTTP.
pub struct FabricConnectorClient {
    client: Client,
    base_url: String,
    instance_id: String,
}

impl FabricConnectorClient {
    /// Creates a new client for the connector at `base_url`.
    pub fn new(instance_id: &str, base_url: &str, timeout: Duration) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| ConnectorError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            instance_id: instance_id.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl FabricConnector for FabricConnectorClient {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    async fn run_transaction(
        &self,
        request: RunTransactionRequest,
    ) -> Result<RunTransactionResponse, ConnectorError> {
        let url = format!("{}{}", self.base_url, RUN_TRANSACTION_PATH);
        debug!(
            "POST {} ({} {})",
            url, request.chain_code_id, request.function_name
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ConnectorError::Transport(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<RunTransactionResponse>()
            .await
            .map_err(|e| ConnectorError::Decode(format!("{}: {}", url, e)))
    }
}
