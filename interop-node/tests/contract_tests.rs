//! Unit tests for the hash time lock state machine
//!
//! These tests drive the contract logic directly with explicit timestamps,
//! without a ledger in between.

use chain_clients_common::EvmAddress;
use interop_node::htlc::contract::{
    swap_id, token_swap_id, HashTimeLock, HtlcError, HtlcEvent, NewContractArgs,
};
use interop_node::htlc::secret::Secret;
use interop_node::htlc::status::SwapStatus;
#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{
    dummy_hash_lock, dummy_secret, receiver_addr, sender_addr, DUMMY_NOW, DUMMY_OUTPUT_ADDRESS,
    DUMMY_OUTPUT_NETWORK, DUMMY_SWAP_DURATION, DUMMY_WRONG_SECRET,
};

const DUMMY_AMOUNT: u64 = 1_000;
const EXPIRATION: u64 = DUMMY_NOW + DUMMY_SWAP_DURATION;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn default_args() -> NewContractArgs {
    NewContractArgs {
        output_amount: DUMMY_AMOUNT * 2,
        expiration: EXPIRATION,
        hash_lock: dummy_hash_lock(),
        receiver: receiver_addr(),
        output_network: DUMMY_OUTPUT_NETWORK.to_string(),
        output_address: DUMMY_OUTPUT_ADDRESS.to_string(),
    }
}

/// Creates one active swap and returns the contract with its id.
fn contract_with_swap() -> (HashTimeLock, chain_clients_common::Bytes32) {
    let mut htlc = HashTimeLock::new();
    let (id, _) = htlc
        .new_contract(sender_addr(), DUMMY_AMOUNT, default_args(), DUMMY_NOW)
        .expect("newContract should succeed");
    (htlc, id)
}

// ============================================================================
// NEW CONTRACT
// ============================================================================

/// Test that newContract stores an active swap under the derived id
/// Why: Clients compute the id off-chain from the same fields to track the swap
#[test]
fn test_new_contract_creates_active_swap() {
    let mut htlc = HashTimeLock::new();
    let (id, event) = htlc
        .new_contract(sender_addr(), DUMMY_AMOUNT, default_args(), DUMMY_NOW)
        .unwrap();

    assert_eq!(
        id,
        swap_id(&sender_addr(), &receiver_addr(), DUMMY_AMOUNT, &dummy_hash_lock(), EXPIRATION)
    );
    assert_eq!(htlc.get_single_status(&id, DUMMY_NOW), SwapStatus::Active);
    assert!(htlc.contract_exists(&id));

    let stored = htlc.get(&id).unwrap();
    assert_eq!(stored.input_amount, DUMMY_AMOUNT);
    assert_eq!(stored.output_amount, DUMMY_AMOUNT * 2);
    assert_eq!(stored.token_address, None);

    match event {
        HtlcEvent::NewContract {
            id: event_id,
            sender,
            receiver,
            output_network,
            ..
        } => {
            assert_eq!(event_id, id);
            assert_eq!(sender, sender_addr());
            assert_eq!(receiver, receiver_addr());
            assert_eq!(output_network, DUMMY_OUTPUT_NETWORK);
        }
        other => panic!("Expected NewContract event, got {:?}", other),
    }
}

/// Test that an expiration at or before the current time is rejected
/// Why: A swap that is already expired could never be withdrawn
#[test]
fn test_new_contract_rejects_past_expiration() {
    let mut htlc = HashTimeLock::new();

    let mut args = default_args();
    args.expiration = DUMMY_NOW;
    assert_eq!(
        htlc.new_contract(sender_addr(), DUMMY_AMOUNT, args, DUMMY_NOW).unwrap_err(),
        HtlcError::InvalidTime
    );

    let mut args = default_args();
    args.expiration = DUMMY_NOW - 1;
    assert_eq!(
        htlc.new_contract(sender_addr(), DUMMY_AMOUNT, args, DUMMY_NOW).unwrap_err(),
        HtlcError::InvalidTime
    );
    assert!(htlc.is_empty());
}

/// Test that a zero input amount is rejected
#[test]
fn test_new_contract_rejects_zero_amount() {
    let mut htlc = HashTimeLock::new();

    assert_eq!(
        htlc.new_contract(sender_addr(), 0, default_args(), DUMMY_NOW).unwrap_err(),
        HtlcError::InvalidAmount
    );
}

/// Test that the time check runs before the amount check
/// Why: Callers match on the revert reason; the order must be stable
#[test]
fn test_new_contract_check_order() {
    let mut htlc = HashTimeLock::new();
    let mut args = default_args();
    args.expiration = DUMMY_NOW;

    assert_eq!(
        htlc.new_contract(sender_addr(), 0, args, DUMMY_NOW).unwrap_err(),
        HtlcError::InvalidTime
    );
}

/// Test that creating the same swap twice is rejected
/// Why: The id is derived from the swap fields; a second insert would overwrite live funds
#[test]
fn test_new_contract_rejects_duplicate() {
    let (mut htlc, _) = contract_with_swap();

    assert_eq!(
        htlc.new_contract(sender_addr(), DUMMY_AMOUNT, default_args(), DUMMY_NOW)
            .unwrap_err(),
        HtlcError::SwapAlreadyExists
    );
    assert_eq!(htlc.len(), 1);
}

/// Test that swaps differing in any id field get different ids
#[test]
fn test_swap_id_depends_on_every_field() {
    let base = swap_id(&sender_addr(), &receiver_addr(), DUMMY_AMOUNT, &dummy_hash_lock(), EXPIRATION);

    let other_hash = Secret::from([9u8; 32]).hash();
    let variants = [
        swap_id(&receiver_addr(), &sender_addr(), DUMMY_AMOUNT, &dummy_hash_lock(), EXPIRATION),
        swap_id(&sender_addr(), &receiver_addr(), DUMMY_AMOUNT + 1, &dummy_hash_lock(), EXPIRATION),
        swap_id(&sender_addr(), &receiver_addr(), DUMMY_AMOUNT, &other_hash, EXPIRATION),
        swap_id(&sender_addr(), &receiver_addr(), DUMMY_AMOUNT, &dummy_hash_lock(), EXPIRATION + 1),
        token_swap_id(
            &sender_addr(),
            &receiver_addr(),
            DUMMY_AMOUNT,
            &dummy_hash_lock(),
            EXPIRATION,
            &EvmAddress::default(),
        ),
    ];
    for variant in variants {
        assert_ne!(variant, base);
    }
}

// ============================================================================
// WITHDRAW
// ============================================================================

/// Test that the receiver is paid when the secret is revealed before expiration
#[test]
fn test_withdraw_pays_receiver() {
    let (mut htlc, id) = contract_with_swap();

    let (payout, event) = htlc.withdraw(&id, &dummy_secret(), DUMMY_NOW + 10).unwrap();

    assert_eq!(payout.to, receiver_addr());
    assert_eq!(payout.amount, DUMMY_AMOUNT);
    assert_eq!(payout.token_address, None);
    assert_eq!(htlc.get_single_status(&id, DUMMY_NOW + 10), SwapStatus::Withdrawn);
    match event {
        HtlcEvent::Withdraw { secret, .. } => assert_eq!(secret, dummy_secret().as_bytes32()),
        other => panic!("Expected Withdraw event, got {:?}", other),
    }
}

/// Test that a wrong secret is rejected and leaves the swap active
#[test]
fn test_withdraw_rejects_wrong_secret() {
    let (mut htlc, id) = contract_with_swap();
    let wrong: Secret = DUMMY_WRONG_SECRET.parse().unwrap();

    assert_eq!(
        htlc.withdraw(&id, &wrong, DUMMY_NOW).unwrap_err(),
        HtlcError::InvalidSecret
    );
    assert_eq!(htlc.get_single_status(&id, DUMMY_NOW), SwapStatus::Active);
}

/// Test that withdraw is closed from the expiration timestamp on
/// Why: At expiration both parties could otherwise claim the funds in the same block
#[test]
fn test_withdraw_rejected_at_expiration() {
    let (mut htlc, id) = contract_with_swap();

    assert_eq!(
        htlc.withdraw(&id, &dummy_secret(), EXPIRATION).unwrap_err(),
        HtlcError::InvalidTime
    );
}

/// Test that an unknown or already settled swap cannot be withdrawn
#[test]
fn test_withdraw_requires_active_swap() {
    let (mut htlc, id) = contract_with_swap();
    let unknown = Secret::from([7u8; 32]).as_bytes32();

    assert_eq!(
        htlc.withdraw(&unknown, &dummy_secret(), DUMMY_NOW).unwrap_err(),
        HtlcError::SwapNotActive
    );

    htlc.withdraw(&id, &dummy_secret(), DUMMY_NOW).unwrap();
    assert_eq!(
        htlc.withdraw(&id, &dummy_secret(), DUMMY_NOW).unwrap_err(),
        HtlcError::SwapNotActive
    );
    assert_eq!(htlc.refund(&id, EXPIRATION).unwrap_err(), HtlcError::SwapNotActive);
}

/// Test that the active check runs before the time and secret checks
#[test]
fn test_withdraw_check_order() {
    let (mut htlc, id) = contract_with_swap();
    htlc.refund(&id, EXPIRATION).unwrap();

    let wrong: Secret = DUMMY_WRONG_SECRET.parse().unwrap();
    assert_eq!(
        htlc.withdraw(&id, &wrong, EXPIRATION + 100).unwrap_err(),
        HtlcError::SwapNotActive
    );

    let (mut htlc, id) = contract_with_swap();
    assert_eq!(
        htlc.withdraw(&id, &wrong, EXPIRATION + 100).unwrap_err(),
        HtlcError::InvalidTime,
        "Time is checked before the secret"
    );
}

// ============================================================================
// REFUND
// ============================================================================

/// Test that refund is rejected before expiration
#[test]
fn test_refund_rejected_before_expiration() {
    let (mut htlc, id) = contract_with_swap();

    assert_eq!(htlc.refund(&id, EXPIRATION - 1).unwrap_err(), HtlcError::InvalidTime);
    assert_eq!(htlc.get_single_status(&id, EXPIRATION - 1), SwapStatus::Active);
}

/// Test that refund opens exactly at expiration and pays the sender
#[test]
fn test_refund_at_expiration_pays_sender() {
    let (mut htlc, id) = contract_with_swap();

    let (payout, event) = htlc.refund(&id, EXPIRATION).unwrap();

    assert_eq!(payout.to, sender_addr());
    assert_eq!(payout.amount, DUMMY_AMOUNT);
    assert!(matches!(event, HtlcEvent::Refund { .. }));
    assert_eq!(htlc.get_single_status(&id, EXPIRATION), SwapStatus::Refunded);
}

// ============================================================================
// STATUS
// ============================================================================

/// Test that an active swap reports Active at expiration and Expired only after it
/// Why: Expired is derived at query time and never stored
#[test]
fn test_status_expired_is_derived() {
    let (htlc, id) = contract_with_swap();

    assert_eq!(htlc.get_single_status(&id, EXPIRATION), SwapStatus::Active);
    assert_eq!(htlc.get_single_status(&id, EXPIRATION + 1), SwapStatus::Expired);
    assert_eq!(htlc.get(&id).unwrap().status, SwapStatus::Active);
}

/// Test that settled swaps keep their status after expiration
#[test]
fn test_status_terminal_after_expiration() {
    let (mut htlc, id) = contract_with_swap();
    htlc.withdraw(&id, &dummy_secret(), DUMMY_NOW).unwrap();

    assert_eq!(htlc.get_single_status(&id, EXPIRATION + 1_000), SwapStatus::Withdrawn);
}

/// Test that getStatus answers every id in order, unknown ids as Invalid
#[test]
fn test_get_status_batch() {
    let (mut htlc, id) = contract_with_swap();
    let unknown = Secret::from([7u8; 32]).as_bytes32();

    let mut args = default_args();
    args.expiration = EXPIRATION + 10;
    let (second, _) = htlc
        .new_contract(sender_addr(), DUMMY_AMOUNT, args, DUMMY_NOW)
        .unwrap();
    htlc.refund(&second, EXPIRATION + 10).unwrap();

    assert_eq!(
        htlc.get_status(&[id, unknown, second], EXPIRATION + 10),
        vec![SwapStatus::Expired, SwapStatus::Invalid, SwapStatus::Refunded]
    );
    assert!(htlc.get_status(&[], DUMMY_NOW).is_empty());
}
