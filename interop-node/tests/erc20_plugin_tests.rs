//! Unit tests for the ERC-20 HTLC plugin
//!
//! Swaps escrow tokens of an ERC-20 deployed on the dev ledger. The lock
//! contract pulls the tokens through an allowance the sender grants first.

use chain_clients_common::{ConnectorError, EvmAddress};
use chain_clients_evm::{EthContractInvocationType, Web3SigningCredential};
use interop_node::htlc::contract::token_swap_id;
use interop_node::htlc::status::SwapStatus;
use interop_node::htlc::{
    Erc20InitializeRequest, Erc20NewContractRequest, Erc20RefundRequest, Erc20StatusRequest,
    Erc20WithdrawRequest, HtlcErc20Plugin,
};
use interop_node::{Plugin, PluginError};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{
    build_htlc_erc20_plugin, create_default_erc20_new_contract_request, deploy_program,
    dummy_hash_lock, invoke, receiver_addr, receiver_credential, sender_addr, sender_credential,
    setup_test_node, TestNode, DUMMY_CONNECTOR_ID, DUMMY_ERC20_BYTECODE, DUMMY_NOW,
    DUMMY_SECRET, DUMMY_SENDER_ADDR, DUMMY_SENDER_KEY, DUMMY_SWAP_DURATION,
};

const DUMMY_SUPPLY: u64 = 1_000_000;
const DUMMY_AMOUNT: u64 = 2_500;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

struct TokenSwapSetup {
    htlc: String,
    token: String,
}

/// Deploys a token and the token lock contract, both owned by the sender.
async fn setup_contracts(node: &TestNode, plugin: &HtlcErc20Plugin) -> TokenSwapSetup {
    let token = deploy_program(node, DUMMY_ERC20_BYTECODE, vec![json!(DUMMY_SUPPLY)]).await;
    let htlc = plugin
        .initialize(Erc20InitializeRequest {
            connector_id: DUMMY_CONNECTOR_ID.to_string(),
            web3_signing_credential: sender_credential(),
            gas: None,
        })
        .await
        .expect("Failed to deploy token lock contract")
        .transaction_receipt
        .contract_address
        .expect("Deployment receipt should carry the contract address");
    TokenSwapSetup { htlc, token }
}

async fn approve(node: &TestNode, setup: &TokenSwapSetup, amount: u64) {
    invoke(
        node,
        &setup.token,
        EthContractInvocationType::Send,
        "approve",
        vec![json!(setup.htlc), json!(amount)],
        sender_credential(),
    )
    .await
    .expect("approve should succeed");
}

async fn token_balance(node: &TestNode, setup: &TokenSwapSetup, account: &EvmAddress) -> u64 {
    let token: EvmAddress = setup.token.parse().unwrap();
    node.ledger
        .token_balance_of(&token, account)
        .await
        .expect("token should be deployed")
}

fn status_request(setup: &TokenSwapSetup, id: Option<String>, ids: Vec<String>) -> Erc20StatusRequest {
    Erc20StatusRequest {
        id,
        ids,
        contract_address: setup.htlc.clone(),
        connector_id: DUMMY_CONNECTOR_ID.to_string(),
        web3_signing_credential: Web3SigningCredential::None,
    }
}

async fn status_of(plugin: &HtlcErc20Plugin, setup: &TokenSwapSetup, id: &str) -> SwapStatus {
    plugin
        .get_single_status(status_request(setup, Some(id.to_string()), vec![]))
        .await
        .expect("getSingleStatus should succeed")
}

/// Approves, locks [`DUMMY_AMOUNT`] and returns the swap id.
async fn lock_tokens(node: &TestNode, plugin: &HtlcErc20Plugin, setup: &TokenSwapSetup) -> String {
    approve(node, setup, DUMMY_AMOUNT).await;
    plugin
        .new_contract(create_default_erc20_new_contract_request(&setup.htlc, &setup.token, DUMMY_AMOUNT))
        .await
        .expect("newContract should succeed")
        .id
        .to_string()
}

// ============================================================================
// TESTS
// ============================================================================

/// Test that the plugin reports its package name
#[tokio::test]
async fn test_plugin_info() {
    let node = setup_test_node().await;
    let plugin = build_htlc_erc20_plugin(&node);

    assert_eq!(plugin.package_name(), "htlc-eth-besu-erc20");
}

/// Test that a token swap escrows tokens and pays the receiver on withdraw
/// Why: This is the complete token-side flow of a cross-ledger swap
#[tokio::test]
async fn test_token_swap_withdraw_flow() {
    let node = setup_test_node().await;
    let plugin = build_htlc_erc20_plugin(&node);
    let setup = setup_contracts(&node, &plugin).await;
    let htlc_addr: EvmAddress = setup.htlc.parse().unwrap();

    let id = lock_tokens(&node, &plugin, &setup).await;

    let expected = token_swap_id(
        &sender_addr(),
        &receiver_addr(),
        DUMMY_AMOUNT,
        &dummy_hash_lock(),
        DUMMY_NOW + DUMMY_SWAP_DURATION,
        &setup.token.parse().unwrap(),
    );
    assert_eq!(id, expected.to_string());
    assert_eq!(token_balance(&node, &setup, &htlc_addr).await, DUMMY_AMOUNT);
    assert_eq!(token_balance(&node, &setup, &sender_addr()).await, DUMMY_SUPPLY - DUMMY_AMOUNT);
    assert_eq!(status_of(&plugin, &setup, &id).await, SwapStatus::Active);

    plugin
        .withdraw(Erc20WithdrawRequest {
            id: id.clone(),
            secret: DUMMY_SECRET.to_string(),
            contract_address: setup.htlc.clone(),
            connector_id: DUMMY_CONNECTOR_ID.to_string(),
            web3_signing_credential: receiver_credential(),
            gas: None,
        })
        .await
        .unwrap();

    assert_eq!(token_balance(&node, &setup, &receiver_addr()).await, DUMMY_AMOUNT);
    assert_eq!(token_balance(&node, &setup, &htlc_addr).await, 0);
    assert_eq!(status_of(&plugin, &setup, &id).await, SwapStatus::Withdrawn);
}

/// Test that tokens return to the sender on refund after expiration
#[tokio::test]
async fn test_token_swap_refund_flow() {
    let node = setup_test_node().await;
    let plugin = build_htlc_erc20_plugin(&node);
    let setup = setup_contracts(&node, &plugin).await;
    let id = lock_tokens(&node, &plugin, &setup).await;
    let refund = Erc20RefundRequest {
        id: id.clone(),
        contract_address: setup.htlc.clone(),
        connector_id: DUMMY_CONNECTOR_ID.to_string(),
        web3_signing_credential: sender_credential(),
        gas: Some(100_000),
    };

    assert_err!(plugin.refund(refund.clone()).await, "Refund before expiration must fail");

    node.clock.set(DUMMY_NOW + DUMMY_SWAP_DURATION);
    assert_ok!(plugin.refund(refund).await);

    assert_eq!(token_balance(&node, &setup, &sender_addr()).await, DUMMY_SUPPLY);
    let statuses = plugin
        .get_status(status_request(&setup, None, vec![id]))
        .await
        .unwrap();
    assert_eq!(statuses, vec![SwapStatus::Refunded]);
}

/// Test that locking without an allowance reverts and creates no swap
#[tokio::test]
async fn test_new_contract_without_allowance() {
    let node = setup_test_node().await;
    let plugin = build_htlc_erc20_plugin(&node);
    let setup = setup_contracts(&node, &plugin).await;

    let error = plugin
        .new_contract(create_default_erc20_new_contract_request(&setup.htlc, &setup.token, DUMMY_AMOUNT))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        PluginError::Connector(ConnectorError::Reverted(ref reason)) if reason == "INSUFFICIENT_ALLOWANCE"
    ));
    assert_eq!(token_balance(&node, &setup, &sender_addr()).await, DUMMY_SUPPLY);
}

/// Test that single-status queries require an id
#[tokio::test]
async fn test_get_single_status_requires_id() {
    let node = setup_test_node().await;
    let plugin = build_htlc_erc20_plugin(&node);
    let setup = setup_contracts(&node, &plugin).await;

    let error = plugin
        .get_single_status(status_request(&setup, None, vec![]))
        .await
        .unwrap_err();

    assert!(matches!(error, PluginError::InvalidArgument(_)));
}

/// Test that newContract needs a credential naming the sending account
/// Why: The swap id includes the sender; without an account it cannot be derived
#[tokio::test]
async fn test_new_contract_requires_signing_account() {
    let node = setup_test_node().await;
    let plugin = build_htlc_erc20_plugin(&node);
    let setup = setup_contracts(&node, &plugin).await;

    let mut request = create_default_erc20_new_contract_request(&setup.htlc, &setup.token, DUMMY_AMOUNT);
    request.web3_signing_credential = Web3SigningCredential::None;

    assert!(matches!(
        plugin.new_contract(request).await,
        Err(PluginError::InvalidArgument(_))
    ));
}

/// Test that requests deserialize from the camelCase JSON clients send
#[test]
fn test_new_contract_request_json() {
    let request: Erc20NewContractRequest = serde_json::from_value(json!({
        "contractAddress": "0x000000000000000000000000000000000000c0de",
        "inputAmount": 10,
        "outputAmount": 1,
        "expiration": 1700003600u64,
        "hashLock": dummy_hash_lock().to_string(),
        "tokenAddress": "0x000000000000000000000000000000000000beef",
        "receiver": "0xFFcf8FDEE72ac11b5c542428B35EEF5769C409f0",
        "outputNetwork": "fabric",
        "outputAddress": "receiver@fabric",
        "connectorId": DUMMY_CONNECTOR_ID,
        "web3SigningCredential": {
            "type": "PRIVATE_KEY_HEX",
            "ethAccount": DUMMY_SENDER_ADDR,
            "secret": DUMMY_SENDER_KEY
        }
    }))
    .unwrap();

    assert_eq!(request.input_amount, 10);
    assert_eq!(request.gas, None);
    assert_eq!(request.web3_signing_credential, sender_credential());
}
