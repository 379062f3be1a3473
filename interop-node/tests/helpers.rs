//! Shared test helpers for unit tests
//!
//! This module provides helper functions used by unit tests.
//!
//! The module is organized into several categories:
//! - **Constants**: Accounts, keychain references and registered bytecodes
//! - **Node Setup**: A dev ledger on a manual clock, a keychain and a registry
//! - **Plugin Builders**: HTLC plugins wired to the test registry
//! - **Request Builders**: Default requests and direct ledger transactions

use chain_clients_evm::{
    DeployContractRequest, EthContractInvocationType, InvokeContractRequest,
    InvokeContractResponse, Web3Connector, Web3SigningCredential, Web3SigningCredentialType,
};
use interop_node::artifact::ContractArtifact;
use interop_node::config::DEFAULT_ESTIMATED_GAS;
use interop_node::dev_ledger::{DevLedger, ManualClock, ProgramKind};
use interop_node::htlc::secret::{Secret, SecretHash};
use interop_node::htlc::{
    Erc20NewContractRequest, HtlcErc20Plugin, HtlcEthPlugin, InitializeRequest, KeychainSigner,
    NewContractRequest,
};
use interop_node::keychain::MemoryKeychain;
use interop_node::registry::PluginRegistry;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// CONSTANTS
// ============================================================================

// --------------------------------- TIME ---------------------------------

/// Block timestamp the test ledger starts at (seconds)
pub const DUMMY_NOW: u64 = 1_700_000_000;

/// Lifetime of test swaps (seconds)
pub const DUMMY_SWAP_DURATION: u64 = 3_600;

// --------------------------------- IDs ----------------------------------

/// Id of the dev ledger connector
pub const DUMMY_CONNECTOR_ID: &str = "dev-besu";

/// Id of the in-memory keychain
pub const DUMMY_KEYCHAIN_ID: &str = "test-keychain";

/// Instance id of the HTLC plugins
pub const DUMMY_HTLC_INSTANCE_ID: &str = "htlc-test";

/// Instance id of the ERC-20 HTLC plugin
pub const DUMMY_HTLC_ERC20_INSTANCE_ID: &str = "htlc-erc20-test";

// -------------------------------- USERS ---------------------------------

/// Swap sender (Ganache account #0)
pub const DUMMY_SENDER_ADDR: &str = "0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1";

/// Private key of the swap sender
pub const DUMMY_SENDER_KEY: &str =
    "0x4f3edf983ac636a65a842ce7c78d9aa706d3b113bce9c46f30d7d21715b23b1d";

/// Swap receiver (Ganache account #1)
pub const DUMMY_RECEIVER_ADDR: &str = "0xFFcf8FDEE72ac11b5c542428B35EEF5769C409f0";

/// Private key of the swap receiver
pub const DUMMY_RECEIVER_KEY: &str =
    "0x6cbed15c793ce57650b9877cf6fa156fbef513c4e6134f022a85b1ffdd59b2a1";

/// Native balance both accounts start with
pub const DUMMY_FUNDING: u64 = 1_000_000_000;

// ---------------------------- KEYCHAIN REFS -----------------------------

pub const DUMMY_SENDER_ACCOUNT_REF: &str = "sender-account";
pub const DUMMY_SENDER_KEY_REF: &str = "sender-private-key";
pub const DUMMY_RECEIVER_ACCOUNT_REF: &str = "receiver-account";
pub const DUMMY_RECEIVER_KEY_REF: &str = "receiver-private-key";

// ------------------------- TOKENS AND CONTRACTS -------------------------

/// Bytecode registered as the native-value lock contract
pub const DUMMY_HTLC_BYTECODE: &str = "0x60016001";

/// Bytecode registered as the ERC-20 lock contract
pub const DUMMY_TOKEN_HTLC_BYTECODE: &str = "0x60026002";

/// Bytecode registered as the ERC-20 token
pub const DUMMY_ERC20_BYTECODE: &str = "0x60036003";

/// Bytecode registered as a record repository
pub const DUMMY_REPOSITORY_BYTECODE: &str = "0x60046004";

/// Address nothing is deployed at
pub const DUMMY_UNKNOWN_CONTRACT_ADDR: &str = "0x000000000000000000000000000000000000dead";

// -------------------------------- SWAPS ---------------------------------

/// Swap secret (32 bytes)
pub const DUMMY_SECRET: &str =
    "0x0101010101010101010101010101010101010101010101010101010101010101";

/// A secret that does not open the test hash lock
pub const DUMMY_WRONG_SECRET: &str =
    "0x0202020202020202020202020202020202020202020202020202020202020202";

pub const DUMMY_OUTPUT_NETWORK: &str = "fabric";
pub const DUMMY_OUTPUT_ADDRESS: &str = "receiver@fabric";

// ============================================================================
// NODE SETUP
// ============================================================================

/// A dev ledger, keychain and registry sharing one manual clock.
pub struct TestNode {
    pub clock: Arc<ManualClock>,
    pub ledger: Arc<DevLedger>,
    pub keychain: Arc<MemoryKeychain>,
    pub registry: Arc<PluginRegistry>,
}

/// Keychain entries for both test accounts.
pub fn dummy_keychain_entries() -> HashMap<String, String> {
    HashMap::from([
        (DUMMY_SENDER_ACCOUNT_REF.to_string(), DUMMY_SENDER_ADDR.to_string()),
        (DUMMY_SENDER_KEY_REF.to_string(), DUMMY_SENDER_KEY.to_string()),
        (DUMMY_RECEIVER_ACCOUNT_REF.to_string(), DUMMY_RECEIVER_ADDR.to_string()),
        (DUMMY_RECEIVER_KEY_REF.to_string(), DUMMY_RECEIVER_KEY.to_string()),
    ])
}

/// Creates a dev ledger with every test program registered and both accounts
/// funded.
pub async fn setup_dev_ledger(clock: Arc<ManualClock>) -> Arc<DevLedger> {
    let ledger = Arc::new(DevLedger::new(DUMMY_CONNECTOR_ID, clock));
    ledger
        .register_program(DUMMY_HTLC_BYTECODE, ProgramKind::HashTimeLock)
        .await;
    ledger
        .register_program(DUMMY_TOKEN_HTLC_BYTECODE, ProgramKind::TokenHashTimeLock)
        .await;
    ledger
        .register_program(DUMMY_ERC20_BYTECODE, ProgramKind::Erc20Token)
        .await;
    ledger
        .register_program(DUMMY_REPOSITORY_BYTECODE, ProgramKind::RecordRepository)
        .await;
    ledger.fund(sender_addr(), DUMMY_FUNDING).await.expect("Failed to fund sender");
    ledger.fund(receiver_addr(), DUMMY_FUNDING).await.expect("Failed to fund receiver");
    ledger
}

/// Sets up a complete test node at [`DUMMY_NOW`].
pub async fn setup_test_node() -> TestNode {
    let clock = Arc::new(ManualClock::new(DUMMY_NOW));
    let ledger = setup_dev_ledger(clock.clone()).await;
    let keychain = Arc::new(MemoryKeychain::with_entries(
        DUMMY_KEYCHAIN_ID,
        "keychain-instance",
        dummy_keychain_entries(),
    ));

    let mut registry = PluginRegistry::new();
    registry
        .add_web3_connector(ledger.clone())
        .expect("Failed to register dev ledger");
    registry
        .add_keychain(keychain.clone())
        .expect("Failed to register keychain");

    TestNode {
        clock,
        ledger,
        keychain,
        registry: Arc::new(registry),
    }
}

// ============================================================================
// PLUGIN BUILDERS
// ============================================================================

/// Native-value HTLC plugin able to deploy the registered lock contract.
pub fn build_htlc_plugin(node: &TestNode) -> HtlcEthPlugin {
    HtlcEthPlugin::new(
        DUMMY_HTLC_INSTANCE_ID,
        node.registry.clone(),
        ContractArtifact::hash_time_lock().with_bytecode(DUMMY_HTLC_BYTECODE),
        DEFAULT_ESTIMATED_GAS,
    )
    .expect("Failed to create HTLC plugin")
}

/// ERC-20 HTLC plugin able to deploy the registered token lock contract.
pub fn build_htlc_erc20_plugin(node: &TestNode) -> HtlcErc20Plugin {
    HtlcErc20Plugin::new(
        DUMMY_HTLC_ERC20_INSTANCE_ID,
        node.registry.clone(),
        ContractArtifact::token_hash_time_lock().with_bytecode(DUMMY_TOKEN_HTLC_BYTECODE),
        DEFAULT_ESTIMATED_GAS,
    )
    .expect("Failed to create HTLC ERC-20 plugin")
}

// ============================================================================
// REQUEST BUILDERS
// ============================================================================

pub fn sender_addr() -> chain_clients_common::EvmAddress {
    DUMMY_SENDER_ADDR.parse().expect("valid sender address")
}

pub fn receiver_addr() -> chain_clients_common::EvmAddress {
    DUMMY_RECEIVER_ADDR.parse().expect("valid receiver address")
}

pub fn dummy_secret() -> Secret {
    DUMMY_SECRET.parse().expect("valid secret")
}

pub fn dummy_hash_lock() -> SecretHash {
    dummy_secret().hash()
}

/// Keychain references of the sender, signing with its private key.
pub fn sender_signer() -> KeychainSigner {
    KeychainSigner {
        connector_id: DUMMY_CONNECTOR_ID.to_string(),
        keychain_id: DUMMY_KEYCHAIN_ID.to_string(),
        account_ref: DUMMY_SENDER_ACCOUNT_REF.to_string(),
        private_key_ref: DUMMY_SENDER_KEY_REF.to_string(),
        credential_type: Web3SigningCredentialType::PrivateKeyHex,
    }
}

/// Keychain references of the receiver, signing with its private key.
pub fn receiver_signer() -> KeychainSigner {
    KeychainSigner {
        connector_id: DUMMY_CONNECTOR_ID.to_string(),
        keychain_id: DUMMY_KEYCHAIN_ID.to_string(),
        account_ref: DUMMY_RECEIVER_ACCOUNT_REF.to_string(),
        private_key_ref: DUMMY_RECEIVER_KEY_REF.to_string(),
        credential_type: Web3SigningCredentialType::PrivateKeyHex,
    }
}

pub fn sender_credential() -> Web3SigningCredential {
    Web3SigningCredential::PrivateKeyHex {
        eth_account: DUMMY_SENDER_ADDR.to_string(),
        secret: DUMMY_SENDER_KEY.to_string(),
    }
}

pub fn receiver_credential() -> Web3SigningCredential {
    Web3SigningCredential::PrivateKeyHex {
        eth_account: DUMMY_RECEIVER_ADDR.to_string(),
        secret: DUMMY_RECEIVER_KEY.to_string(),
    }
}

/// Deploys the native-value lock contract through the plugin and returns its address.
pub async fn deploy_htlc(plugin: &HtlcEthPlugin) -> String {
    let response = plugin
        .initialize(InitializeRequest {
            signer: sender_signer(),
            gas: None,
        })
        .await
        .expect("Failed to deploy lock contract");
    response
        .transaction_receipt
        .contract_address
        .expect("Deployment receipt should carry the contract address")
}

/// Deploys a bytecode registered with the test ledger, signed by the sender.
pub async fn deploy_program(node: &TestNode, bytecode: &str, constructor_args: Vec<serde_json::Value>) -> String {
    let response = node
        .ledger
        .deploy_contract(DeployContractRequest {
            bytecode: bytecode.to_string(),
            web3_signing_credential: sender_credential(),
            gas: None,
            gas_price: None,
            constructor_args,
            timeout_ms: None,
        })
        .await
        .expect("Failed to deploy program");
    response
        .transaction_receipt
        .contract_address
        .expect("Deployment receipt should carry the contract address")
}

/// Sends or calls `method` on the test ledger directly.
pub async fn invoke(
    node: &TestNode,
    contract_address: &str,
    invocation_type: EthContractInvocationType,
    method_name: &str,
    params: Vec<serde_json::Value>,
    credential: Web3SigningCredential,
) -> Result<InvokeContractResponse, chain_clients_common::ConnectorError> {
    node.ledger
        .invoke_contract(InvokeContractRequest {
            contract_abi: json!([]),
            contract_address: contract_address.to_string(),
            invocation_type,
            method_name: method_name.to_string(),
            params,
            web3_signing_credential: credential,
            gas: None,
            gas_price: None,
            value: None,
            timeout_ms: None,
        })
        .await
}

/// New-contract request from the sender to the receiver, locked with
/// [`dummy_hash_lock`] and expiring [`DUMMY_SWAP_DURATION`] after [`DUMMY_NOW`].
pub fn create_default_new_contract_request(contract_address: &str, input_amount: u64) -> NewContractRequest {
    NewContractRequest {
        contract_address: contract_address.to_string(),
        input_amount,
        output_amount: input_amount * 2,
        expiration: DUMMY_NOW + DUMMY_SWAP_DURATION,
        hash_lock: dummy_hash_lock().to_string(),
        receiver: DUMMY_RECEIVER_ADDR.to_string(),
        output_network: DUMMY_OUTPUT_NETWORK.to_string(),
        output_address: DUMMY_OUTPUT_ADDRESS.to_string(),
        signer: sender_signer(),
        gas: None,
    }
}

/// ERC-20 counterpart of [`create_default_new_contract_request`].
pub fn create_default_erc20_new_contract_request(
    contract_address: &str,
    token_address: &str,
    input_amount: u64,
) -> Erc20NewContractRequest {
    Erc20NewContractRequest {
        contract_address: contract_address.to_string(),
        input_amount,
        output_amount: input_amount,
        expiration: DUMMY_NOW + DUMMY_SWAP_DURATION,
        hash_lock: dummy_hash_lock().to_string(),
        token_address: token_address.to_string(),
        receiver: DUMMY_RECEIVER_ADDR.to_string(),
        output_network: DUMMY_OUTPUT_NETWORK.to_string(),
        output_address: DUMMY_OUTPUT_ADDRESS.to_string(),
        connector_id: DUMMY_CONNECTOR_ID.to_string(),
        web3_signing_credential: sender_credential(),
        gas: None,
    }
}
