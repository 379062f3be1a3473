//! Web3 ledger connector client
//!
//! Types and an HTTP client for the Besu/Quorum connector services that deploy
//! and invoke Solidity contracts on behalf of the interop node. The
//! [`Web3Connector`] trait is the seam plugins depend on; remote connectors and
//! in-process ledgers both implement it.

mod client;
mod types;

pub use chain_clients_common::ConnectorError;
pub use client::{ConnectorFlavor, Web3ConnectorClient};
pub use types::{
    DeployContractRequest, EthContractInvocationType, InvokeContractRequest,
    InvokeContractResponse, RunTransactionResponse, TransactionReceipt, Web3SigningCredential,
    Web3SigningCredentialType,
};

use async_trait::async_trait;

/// A ledger connector able to deploy and invoke EVM contracts.
#[async_trait]
pub trait Web3Connector: Send + Sync {
    /// Id under which the connector is registered.
    fn instance_id(&self) -> &str;

    /// Deploys contract bytecode; the receipt carries the new contract address.
    async fn deploy_contract(
        &self,
        request: DeployContractRequest,
    ) -> Result<RunTransactionResponse, ConnectorError>;

    /// Sends a transaction to, or calls, a deployed contract.
    async fn invoke_contract(
        &self,
        request: InvokeContractRequest,
    ) -> Result<InvokeContractResponse, ConnectorError>;
}
