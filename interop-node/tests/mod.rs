//! Test module organization
//!
//! This module re-exports test helpers for use in test files.

#[allow(dead_code)]
mod helpers;

#[allow(unused_imports)]
pub use helpers::{
    build_htlc_erc20_plugin, build_htlc_plugin, create_default_erc20_new_contract_request,
    create_default_new_contract_request, deploy_htlc, deploy_program, dummy_hash_lock,
    dummy_keychain_entries, dummy_secret, invoke, receiver_addr, receiver_credential,
    receiver_signer, sender_addr, sender_credential, sender_signer, setup_dev_ledger,
    setup_test_node, TestNode, DUMMY_CONNECTOR_ID, DUMMY_ERC20_BYTECODE, DUMMY_FUNDING,
    DUMMY_HTLC_BYTECODE, DUMMY_HTLC_ERC20_INSTANCE_ID, DUMMY_HTLC_INSTANCE_ID, DUMMY_KEYCHAIN_ID,
    DUMMY_NOW, DUMMY_OUTPUT_ADDRESS, DUMMY_OUTPUT_NETWORK, DUMMY_RECEIVER_ACCOUNT_REF,
    DUMMY_RECEIVER_ADDR, DUMMY_RECEIVER_KEY, DUMMY_RECEIVER_KEY_REF, DUMMY_REPOSITORY_BYTECODE,
    DUMMY_SECRET, DUMMY_SENDER_ACCOUNT_REF, DUMMY_SENDER_ADDR, DUMMY_SENDER_KEY,
    DUMMY_SENDER_KEY_REF, DUMMY_SWAP_DURATION, DUMMY_TOKEN_HTLC_BYTECODE,
    DUMMY_UNKNOWN_CONTRACT_ADDR, DUMMY_WRONG_SECRET,
};
