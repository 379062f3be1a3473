//! HTTP client for a remote web3 ledger connector service.

use async_trait::async_trait;
use chain_clients_common::ConnectorError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::types::{
    DeployContractRequest, InvokeContractRequest, InvokeContractResponse, RunTransactionResponse,
};
use crate::Web3Connector;

/// Which connector package the remote service runs.
///
/// Besu and Quorum connectors expose the same request shapes under different
/// path prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorFlavor {
    Besu,
    Quorum,
}

impl ConnectorFlavor {
    pub fn path_prefix(&self) -> &'static str {
        match self {
            Self::Besu => "/api/v1/plugins/@hyperledger/cactus-plugin-ledger-connector-besu",
            Self::Quorum => "/api/v1/plugins/@hyperledger/cactus-plugin-ledger-connector-quorum",
        }
    }
}

/// Client for a web3 connector reachable over HTTP.
pub struct Web3ConnectorClient {
    /// HTTP client for making requests
    client: Client,
    /// Base URL of the connector service (e.g., "http://127.0.0.1:4000")
    base_url: String,
    instance_id: String,
    flavor: ConnectorFlavor,
}

impl Web3ConnectorClient {
    /// Creates a new client for the connector at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `instance_id` - Id the connector is registered under
    /// * `base_url` - Base URL of the connector service
    /// * `flavor` - Connector package (selects the path prefix)
    /// * `timeout` - Per-request timeout
    pub fn new(
        instance_id: &str,
        base_url: &str,
        flavor: ConnectorFlavor,
        timeout: Duration,
    ) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| ConnectorError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            instance_id: instance_id.to_string(),
            flavor,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn flavor(&self) -> ConnectorFlavor {
        self.flavor
    }

    fn endpoint(&self, operation: &str) -> String {
        format!("{}{}/{}", self.base_url, self.flavor.path_prefix(), operation)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<R, ConnectorError> {
        let url = self.endpoint(operation);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
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
            .json::<R>()
            .await
            .map_err(|e| ConnectorError::Decode(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl Web3Connector for Web3ConnectorClient {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    async fn deploy_contract(
        &self,
        request: DeployContractRequest,
    ) -> Result<RunTransactionResponse, ConnectorError> {
        self.post("deploy-contract-solidity-bytecode", &request).await
    }

    async fn invoke_contract(
        &self,
        request: InvokeContractRequest,
    ) -> Result<InvokeContractResponse, ConnectorError> {
        self.post("invoke-contract", &request).await
    }
}
