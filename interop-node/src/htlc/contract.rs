//! Hash time lock contract state machine
//!
//! Mirrors the on-chain HashTimeLock contract: swaps keyed by a deterministic
//! id move from `Active` to exactly one of `Withdrawn` (secret revealed before
//! expiration) or `Refunded` (after expiration). The same machine backs the
//! ERC-20 variant, where each swap additionally records the token it escrows.
//!
//! All checks take `now` (block timestamp, seconds) explicitly so the
//! transitions are deterministic.

use chain_clients_common::abi::{address_word, bytes32_word, encode_words, uint_word};
use chain_clients_common::{keccak256, Bytes32, EvmAddress};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::secret::{Secret, SecretHash};
use super::status::SwapStatus;

// ============================================================================
// ERRORS AND EVENTS
// ============================================================================

/// Revert reasons of the lock contract. The display string is the reason the
/// contract reverts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HtlcError {
    #[error("INVALID_TIME")]
    InvalidTime,
    #[error("INVALID_AMOUNT")]
    InvalidAmount,
    #[error("SWAP_ALREADY_EXISTS")]
    SwapAlreadyExists,
    #[error("SWAP_NOT_ACTIVE")]
    SwapNotActive,
    #[error("INVALID_SECRET")]
    InvalidSecret,
}

/// Log entries emitted by successful transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HtlcEvent {
    #[serde(rename = "NewContract", rename_all = "camelCase")]
    NewContract {
        id: Bytes32,
        input_amount: u64,
        output_amount: u64,
        expiration: u64,
        hash_lock: SecretHash,
        sender: EvmAddress,
        receiver: EvmAddress,
        output_network: String,
        output_address: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_address: Option<EvmAddress>,
    },
    #[serde(rename = "Withdraw", rename_all = "camelCase")]
    Withdraw {
        id: Bytes32,
        secret: Bytes32,
        hash_lock: SecretHash,
        sender: EvmAddress,
        receiver: EvmAddress,
    },
    #[serde(rename = "Refund", rename_all = "camelCase")]
    Refund {
        id: Bytes32,
        hash_lock: SecretHash,
        sender: EvmAddress,
        receiver: EvmAddress,
    },
}

impl HtlcEvent {
    pub fn swap_id(&self) -> &Bytes32 {
        match self {
            Self::NewContract { id, .. } | Self::Withdraw { id, .. } | Self::Refund { id, .. } => id,
        }
    }
}

// ============================================================================
// SWAP RECORDS
// ============================================================================

/// Arguments of `newContract` beyond the sender and the escrowed amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContractArgs {
    pub output_amount: u64,
    pub expiration: u64,
    pub hash_lock: SecretHash,
    pub receiver: EvmAddress,
    pub output_network: String,
    pub output_address: String,
}

/// One swap as stored by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockContract {
    pub input_amount: u64,
    pub output_amount: u64,
    pub expiration: u64,
    pub status: SwapStatus,
    pub hash_lock: SecretHash,
    pub sender: EvmAddress,
    pub receiver: EvmAddress,
    pub output_network: String,
    pub output_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<EvmAddress>,
}

/// Funds released by a withdraw or refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub to: EvmAddress,
    pub amount: u64,
    /// `None` for native value
    pub token_address: Option<EvmAddress>,
}

/// Swap id of a native-value swap:
/// `keccak256(abi.encode(sender, receiver, inputAmount, hashLock, expiration))`.
pub fn swap_id(
    sender: &EvmAddress,
    receiver: &EvmAddress,
    input_amount: u64,
    hash_lock: &SecretHash,
    expiration: u64,
) -> Bytes32 {
    Bytes32(keccak256(&encode_words(&[
        address_word(sender),
        address_word(receiver),
        uint_word(input_amount.into()),
        bytes32_word(hash_lock.as_bytes32()),
        uint_word(expiration.into()),
    ])))
}

/// Swap id of a token swap; the token address is appended to the encoding.
pub fn token_swap_id(
    sender: &EvmAddress,
    receiver: &EvmAddress,
    input_amount: u64,
    hash_lock: &SecretHash,
    expiration: u64,
    token_address: &EvmAddress,
) -> Bytes32 {
    Bytes32(keccak256(&encode_words(&[
        address_word(sender),
        address_word(receiver),
        uint_word(input_amount.into()),
        bytes32_word(hash_lock.as_bytes32()),
        uint_word(expiration.into()),
        address_word(token_address),
    ])))
}

// ============================================================================
// STATE MACHINE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct HashTimeLock {
    contracts: HashMap<Bytes32, LockContract>,
}

impl HashTimeLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a new swap and builds its record without storing it.
    ///
    /// Split from [`HashTimeLock::insert`] so a token swap can pull its funds
    /// between validation and storage.
    ///
    /// # Arguments
    ///
    /// * `sender` - Account creating the swap
    /// * `input_amount` - Amount escrowed by the swap
    /// * `args` - Remaining `newContract` arguments
    /// * `token_address` - Escrowed token, `None` for native value
    /// * `now` - Current block timestamp in seconds
    ///
    /// # Returns
    ///
    /// * `Ok((id, record))` - Swap id and the record to store
    /// * `Err(HtlcError)` - The revert reason
    pub fn prepare(
        &self,
        sender: EvmAddress,
        input_amount: u64,
        args: NewContractArgs,
        token_address: Option<EvmAddress>,
        now: u64,
    ) -> Result<(Bytes32, LockContract), HtlcError> {
        if args.expiration <= now {
            return Err(HtlcError::InvalidTime);
        }
        if input_amount == 0 {
            return Err(HtlcError::InvalidAmount);
        }

        let id = match &token_address {
            Some(token) => token_swap_id(
                &sender,
                &args.receiver,
                input_amount,
                &args.hash_lock,
                args.expiration,
                token,
            ),
            None => swap_id(
                &sender,
                &args.receiver,
                input_amount,
                &args.hash_lock,
                args.expiration,
            ),
        };
        if self.contract_exists(&id) {
            return Err(HtlcError::SwapAlreadyExists);
        }

        Ok((
            id,
            LockContract {
                input_amount,
                output_amount: args.output_amount,
                expiration: args.expiration,
                status: SwapStatus::Active,
                hash_lock: args.hash_lock,
                sender,
                receiver: args.receiver,
                output_network: args.output_network,
                output_address: args.output_address,
                token_address,
            },
        ))
    }

    /// Stores a record produced by [`HashTimeLock::prepare`].
    pub fn insert(&mut self, id: Bytes32, contract: LockContract) -> HtlcEvent {
        let event = HtlcEvent::NewContract {
            id,
            input_amount: contract.input_amount,
            output_amount: contract.output_amount,
            expiration: contract.expiration,
            hash_lock: contract.hash_lock,
            sender: contract.sender,
            receiver: contract.receiver,
            output_network: contract.output_network.clone(),
            output_address: contract.output_address.clone(),
            token_address: contract.token_address,
        };
        self.contracts.insert(id, contract);
        event
    }

    /// Creates a native-value swap.
    pub fn new_contract(
        &mut self,
        sender: EvmAddress,
        input_amount: u64,
        args: NewContractArgs,
        now: u64,
    ) -> Result<(Bytes32, HtlcEvent), HtlcError> {
        let (id, contract) = self.prepare(sender, input_amount, args, None, now)?;
        Ok((id, self.insert(id, contract)))
    }

    /// Releases the escrow to the receiver when `secret` opens the hash lock
    /// before expiration.
    pub fn withdraw(
        &mut self,
        id: &Bytes32,
        secret: &Secret,
        now: u64,
    ) -> Result<(Payout, HtlcEvent), HtlcError> {
        let contract = self.active_contract_mut(id)?;
        if contract.expiration <= now {
            return Err(HtlcError::InvalidTime);
        }
        if !secret.unlocks(&contract.hash_lock) {
            return Err(HtlcError::InvalidSecret);
        }

        contract.status = SwapStatus::Withdrawn;
        let payout = Payout {
            to: contract.receiver,
            amount: contract.input_amount,
            token_address: contract.token_address,
        };
        let event = HtlcEvent::Withdraw {
            id: *id,
            secret: secret.as_bytes32(),
            hash_lock: contract.hash_lock,
            sender: contract.sender,
            receiver: contract.receiver,
        };
        Ok((payout, event))
    }

    /// Returns the escrow to the sender once the swap has expired.
    pub fn refund(&mut self, id: &Bytes32, now: u64) -> Result<(Payout, HtlcEvent), HtlcError> {
        let contract = self.active_contract_mut(id)?;
        if contract.expiration > now {
            return Err(HtlcError::InvalidTime);
        }

        contract.status = SwapStatus::Refunded;
        let payout = Payout {
            to: contract.sender,
            amount: contract.input_amount,
            token_address: contract.token_address,
        };
        let event = HtlcEvent::Refund {
            id: *id,
            hash_lock: contract.hash_lock,
            sender: contract.sender,
            receiver: contract.receiver,
        };
        Ok((payout, event))
    }

    /// Status of one swap; unknown ids report `Invalid`.
    ///
    /// An active swap strictly past its expiration reports `Expired`. At
    /// exactly `expiration` it still reports `Active`, although withdraw is
    /// already closed and refund already open.
    pub fn get_single_status(&self, id: &Bytes32, now: u64) -> SwapStatus {
        match self.contracts.get(id) {
            None => SwapStatus::Invalid,
            Some(c) if c.status == SwapStatus::Active && c.expiration < now => SwapStatus::Expired,
            Some(c) => c.status,
        }
    }

    pub fn get_status(&self, ids: &[Bytes32], now: u64) -> Vec<SwapStatus> {
        ids.iter().map(|id| self.get_single_status(id, now)).collect()
    }

    pub fn contract_exists(&self, id: &Bytes32) -> bool {
        self.contracts
            .get(id)
            .map(|c| c.status != SwapStatus::Invalid)
            .unwrap_or(false)
    }

    pub fn get(&self, id: &Bytes32) -> Option<&LockContract> {
        self.contracts.get(id)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    fn active_contract_mut(&mut self, id: &Bytes32) -> Result<&mut LockContract, HtlcError> {
        match self.contracts.get_mut(id) {
            Some(contract) if contract.status == SwapStatus::Active => Ok(contract),
            _ => Err(HtlcError::SwapNotActive),
        }
    }
}
