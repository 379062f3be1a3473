//! Development ledger
//!
//! An in-process [`Web3Connector`] that executes the lock contracts, a minimal
//! ERC-20 token and a record repository directly in Rust. It lets the node and
//! its tests run complete swaps without an external chain.
//!
//! Deployment only accepts bytecode registered to a [`ProgramKind`]. Sends run
//! against a copy of the ledger state that is committed only when the whole
//! transaction succeeds, so a revert leaves no partial effects.

mod params;
pub mod signer;
pub mod token;

use async_trait::async_trait;
use chain_clients_common::abi::{address_word, encode_words, uint_word};
use chain_clients_common::{keccak256, normalize_hex, Bytes32, ConnectorError, EvmAddress};
use chain_clients_evm::{
    DeployContractRequest, EthContractInvocationType, InvokeContractRequest,
    InvokeContractResponse, RunTransactionResponse, TransactionReceipt, Web3Connector,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::DevLedgerConfig;
use crate::htlc::contract::{HashTimeLock, HtlcEvent, NewContractArgs, Payout};
use crate::htlc::secret::{Secret, SecretHash};
use signer::{resolve_caller, resolve_sender};
use token::Erc20Token;

/// Gas charged for every transaction.
pub const INTRINSIC_GAS: u64 = 21_000;

// ============================================================================
// CLOCK
// ============================================================================

/// Source of block timestamps (seconds).
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ============================================================================
// PROGRAMS
// ============================================================================

/// Contract programs the dev ledger can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramKind {
    /// Native-value lock contract
    HashTimeLock,
    /// ERC-20 lock contract
    TokenHashTimeLock,
    /// ERC-20 token; constructor argument is the initial supply
    Erc20Token,
    /// Append-only list of records (`insertRecord` / `getAllRecords`)
    RecordRepository,
}

#[derive(Debug, Clone)]
enum Program {
    HashTimeLock(HashTimeLock),
    TokenHashTimeLock(HashTimeLock),
    Erc20Token(Erc20Token),
    RecordRepository(Vec<Value>),
}

impl Program {
    fn instantiate(kind: ProgramKind, deployer: EvmAddress, constructor_args: &[Value]) -> Result<Self, ConnectorError> {
        Ok(match kind {
            ProgramKind::HashTimeLock => Self::HashTimeLock(HashTimeLock::new()),
            ProgramKind::TokenHashTimeLock => Self::TokenHashTimeLock(HashTimeLock::new()),
            ProgramKind::Erc20Token => {
                let supply = match constructor_args.first() {
                    Some(_) => params::uint(constructor_args, "constructor", 0, "initialSupply")?,
                    None => 0,
                };
                Self::Erc20Token(Erc20Token::new(deployer, supply))
            }
            ProgramKind::RecordRepository => Self::RecordRepository(Vec::new()),
        })
    }
}

/// An event together with the contract that emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent {
    pub address: EvmAddress,
    pub block_number: u64,
    pub event: HtlcEvent,
}

// ============================================================================
// LEDGER STATE
// ============================================================================

#[derive(Debug, Clone, Default)]
struct LedgerState {
    /// Registered bytecode (normalized hex) -> program
    bytecodes: HashMap<String, ProgramKind>,
    balances: HashMap<EvmAddress, u64>,
    contracts: HashMap<EvmAddress, Program>,
    /// Events of the transaction in flight; moved to the event log on commit
    pending_events: Vec<LoggedEvent>,
    nonce: u64,
    block_number: u64,
}

/// Per-transaction context.
struct Tx {
    sender: EvmAddress,
    value: u64,
    now: u64,
    block_number: u64,
}

fn revert(reason: impl ToString) -> ConnectorError {
    ConnectorError::Reverted(reason.to_string())
}

fn unknown_method(method: &str, kind: &str) -> ConnectorError {
    ConnectorError::Rejected(format!("{} has no method '{}'", kind, method))
}

impl LedgerState {
    fn balance_of(&self, account: &EvmAddress) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn move_value(&mut self, from: EvmAddress, to: EvmAddress, amount: u64) -> Result<(), ConnectorError> {
        if amount == 0 {
            return Ok(());
        }
        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(ConnectorError::Rejected(format!(
                "insufficient funds: {} has {}, needs {}",
                from, from_balance, amount
            )));
        }
        self.balances.insert(from, from_balance - amount);
        self.credit(to, amount)
    }

    fn credit(&mut self, account: EvmAddress, amount: u64) -> Result<(), ConnectorError> {
        let balance = self.balance_of(&account);
        let credited = balance.checked_add(amount).ok_or_else(|| {
            ConnectorError::Rejected(format!("balance overflow: {} has {}, receives {}", account, balance, amount))
        })?;
        self.balances.insert(account, credited);
        Ok(())
    }

    fn next_address(&mut self, deployer: &EvmAddress) -> EvmAddress {
        let hash = keccak256(&encode_words(&[
            address_word(deployer),
            uint_word(self.nonce.into()),
        ]));
        EvmAddress::from_hash(&hash)
    }

    fn next_tx_hash(&mut self, sender: &EvmAddress) -> String {
        let hash = keccak256(&encode_words(&[
            address_word(sender),
            uint_word(self.nonce.into()),
            uint_word(self.block_number.into()),
        ]));
        self.nonce += 1;
        Bytes32(hash).to_string()
    }

    fn token_mut(&mut self, address: &EvmAddress) -> Result<&mut Erc20Token, ConnectorError> {
        match self.contracts.get_mut(address) {
            Some(Program::Erc20Token(token)) => Ok(token),
            _ => Err(revert(format!("{} is not an ERC-20 token", address))),
        }
    }

    fn log(&mut self, address: EvmAddress, block_number: u64, event: HtlcEvent) {
        self.pending_events.push(LoggedEvent {
            address,
            block_number,
            event,
        });
    }

    /// Pays out a released escrow held by the lock contract at `address`.
    fn release(&mut self, address: EvmAddress, payout: Payout) -> Result<(), ConnectorError> {
        match payout.token_address {
            Some(token) => self
                .token_mut(&token)?
                .transfer(address, payout.to, payout.amount)
                .map_err(revert),
            None => self.move_value(address, payout.to, payout.amount),
        }
    }

    fn send(&mut self, tx: &Tx, address: EvmAddress, method: &str, params: &[Value]) -> Result<(), ConnectorError> {
        let mut program = self
            .contracts
            .remove(&address)
            .ok_or_else(|| ConnectorError::Rejected(format!("no contract at {}", address)))?;

        let payable = matches!(program, Program::HashTimeLock(_)) && method == "newContract";
        if tx.value > 0 && !payable {
            return Err(revert(format!("{} is not payable", method)));
        }
        self.move_value(tx.sender, address, tx.value)?;

        let result = match &mut program {
            Program::HashTimeLock(htlc) => self.send_hash_time_lock(tx, address, htlc, method, params),
            Program::TokenHashTimeLock(htlc) => self.send_token_hash_time_lock(tx, address, htlc, method, params),
            Program::Erc20Token(token) => send_erc20(tx, token, method, params),
            Program::RecordRepository(records) => match method {
                "insertRecord" => {
                    records.push(params::any(params, method, 0, "record")?);
                    Ok(())
                }
                _ => Err(unknown_method(method, "RecordRepository")),
            },
        };
        self.contracts.insert(address, program);
        result
    }

    fn send_hash_time_lock(
        &mut self,
        tx: &Tx,
        address: EvmAddress,
        htlc: &mut HashTimeLock,
        method: &str,
        params: &[Value],
    ) -> Result<(), ConnectorError> {
        match method {
            "newContract" => {
                let args = NewContractArgs {
                    output_amount: params::uint(params, method, 0, "outputAmount")?,
                    expiration: params::uint(params, method, 1, "expiration")?,
                    hash_lock: SecretHash(params::bytes32(params, method, 2, "hashLock")?),
                    receiver: params::address(params, method, 3, "receiver")?,
                    output_network: params::string(params, method, 4, "outputNetwork")?,
                    output_address: params::string(params, method, 5, "outputAddress")?,
                };
                let (_, event) = htlc
                    .new_contract(tx.sender, tx.value, args, tx.now)
                    .map_err(revert)?;
                self.log(address, tx.block_number, event);
                Ok(())
            }
            "withdraw" => {
                let id = params::bytes32(params, method, 0, "id")?;
                let secret = Secret::from(params::bytes32(params, method, 1, "secret")?);
                let (payout, event) = htlc.withdraw(&id, &secret, tx.now).map_err(revert)?;
                self.release(address, payout)?;
                self.log(address, tx.block_number, event);
                Ok(())
            }
            "refund" => {
                let id = params::bytes32(params, method, 0, "id")?;
                let (payout, event) = htlc.refund(&id, tx.now).map_err(revert)?;
                self.release(address, payout)?;
                self.log(address, tx.block_number, event);
                Ok(())
            }
            _ => Err(unknown_method(method, "HashTimeLock")),
        }
    }

    fn send_token_hash_time_lock(
        &mut self,
        tx: &Tx,
        address: EvmAddress,
        htlc: &mut HashTimeLock,
        method: &str,
        params: &[Value],
    ) -> Result<(), ConnectorError> {
        if method != "newContract" {
            // withdraw and refund behave as in the native contract; release()
            // routes the payout through the token.
            return self.send_hash_time_lock(tx, address, htlc, method, params);
        }

        let input_amount = params::uint(params, method, 0, "inputAmount")?;
        let token_address = params::address(params, method, 4, "tokenAddress")?;
        let args = NewContractArgs {
            output_amount: params::uint(params, method, 1, "outputAmount")?,
            expiration: params::uint(params, method, 2, "expiration")?,
            hash_lock: SecretHash(params::bytes32(params, method, 3, "hashLock")?),
            receiver: params::address(params, method, 5, "receiver")?,
            output_network: params::string(params, method, 6, "outputNetwork")?,
            output_address: params::string(params, method, 7, "outputAddress")?,
        };

        let (id, contract) = htlc
            .prepare(tx.sender, input_amount, args, Some(token_address), tx.now)
            .map_err(revert)?;
        self.token_mut(&token_address)?
            .transfer_from(address, tx.sender, address, input_amount)
            .map_err(revert)?;
        let event = htlc.insert(id, contract);
        self.log(address, tx.block_number, event);
        Ok(())
    }

    fn call(
        &self,
        caller: EvmAddress,
        now: u64,
        address: EvmAddress,
        method: &str,
        params: &[Value],
    ) -> Result<Value, ConnectorError> {
        let program = self
            .contracts
            .get(&address)
            .ok_or_else(|| ConnectorError::Rejected(format!("no contract at {}", address)))?;

        let output = match program {
            Program::HashTimeLock(htlc) | Program::TokenHashTimeLock(htlc) => match method {
                "getSingleStatus" => {
                    let id = params::bytes32(params, method, 0, "id")?;
                    Ok(json!(htlc.get_single_status(&id, now).code().to_string()))
                }
                "getStatus" => {
                    let ids = params::bytes32_array(params, method, 0, "ids")?;
                    let codes: Vec<String> = htlc
                        .get_status(&ids, now)
                        .into_iter()
                        .map(|s| s.code().to_string())
                        .collect();
                    Ok(json!(codes))
                }
                "contractExists" => {
                    let id = params::bytes32(params, method, 0, "id")?;
                    Ok(json!(htlc.contract_exists(&id)))
                }
                "INVALID" => Ok(json!("0")),
                "ACTIVE" => Ok(json!("1")),
                "REFUNDED" => Ok(json!("2")),
                "WITHDRAWN" => Ok(json!("3")),
                "EXPIRED" => Ok(json!("4")),
                _ => Err(unknown_method(method, "HashTimeLock")),
            },
            Program::Erc20Token(token) => match method {
                "balanceOf" => {
                    let account = params::address(params, method, 0, "account")?;
                    Ok(json!(token.balance_of(&account).to_string()))
                }
                "allowance" => {
                    let owner = params::address(params, method, 0, "owner")?;
                    let spender = params::address(params, method, 1, "spender")?;
                    Ok(json!(token.allowance(&owner, &spender).to_string()))
                }
                "totalSupply" => Ok(json!(token.total_supply().to_string())),
                _ => Err(unknown_method(method, "Erc20Token")),
            },
            Program::RecordRepository(records) => match method {
                "getAllRecords" => Ok(Value::Array(records.clone())),
                _ => Err(unknown_method(method, "RecordRepository")),
            },
        }?;
        debug!("call {}.{} from {}", address, method, caller);
        Ok(output)
    }
}

fn send_erc20(tx: &Tx, token: &mut Erc20Token, method: &str, params: &[Value]) -> Result<(), ConnectorError> {
    match method {
        "approve" => {
            let spender = params::address(params, method, 0, "spender")?;
            let amount = params::uint(params, method, 1, "amount")?;
            token.approve(tx.sender, spender, amount);
            Ok(())
        }
        "transfer" => {
            let to = params::address(params, method, 0, "to")?;
            let amount = params::uint(params, method, 1, "amount")?;
            token.transfer(tx.sender, to, amount).map_err(revert)
        }
        "transferFrom" => {
            let from = params::address(params, method, 0, "from")?;
            let to = params::address(params, method, 1, "to")?;
            let amount = params::uint(params, method, 2, "amount")?;
            token.transfer_from(tx.sender, from, to, amount).map_err(revert)
        }
        _ => Err(unknown_method(method, "Erc20Token")),
    }
}

fn check_gas(gas: Option<u64>) -> Result<u64, ConnectorError> {
    match gas {
        Some(gas) if gas < INTRINSIC_GAS => Err(ConnectorError::Rejected(format!(
            "intrinsic gas too low: {} < {}",
            gas, INTRINSIC_GAS
        ))),
        _ => Ok(INTRINSIC_GAS),
    }
}

// ============================================================================
// DEV LEDGER
// ============================================================================

pub struct DevLedger {
    instance_id: String,
    clock: Arc<dyn Clock>,
    state: Mutex<LedgerState>,
    events: Mutex<Vec<LoggedEvent>>,
}

impl DevLedger {
    pub fn new(instance_id: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            clock,
            state: Mutex::new(LedgerState::default()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Builds a ledger with the genesis state described by `config`.
    pub fn from_config(
        instance_id: &str,
        config: &DevLedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConnectorError> {
        let mut state = LedgerState::default();
        for account in &config.accounts {
            let address: EvmAddress = account
                .address
                .parse()
                .map_err(|e| ConnectorError::Rejected(format!("invalid account {}: {}", account.address, e)))?;
            state.balances.insert(address, account.balance);
        }
        for program in &config.programs {
            state
                .bytecodes
                .insert(normalize_hex(&program.bytecode), program.kind);
        }
        for predeploy in &config.predeployed {
            let address: EvmAddress = predeploy
                .address
                .parse()
                .map_err(|e| ConnectorError::Rejected(format!("invalid address {}: {}", predeploy.address, e)))?;
            let program = Program::instantiate(predeploy.kind, EvmAddress::default(), &[])?;
            state.contracts.insert(address, program);
        }

        Ok(Self {
            instance_id: instance_id.to_string(),
            clock,
            state: Mutex::new(state),
            events: Mutex::new(Vec::new()),
        })
    }

    /// Accepts `bytecode` for deployment as a `kind` program.
    pub async fn register_program(&self, bytecode: &str, kind: ProgramKind) {
        self.state
            .lock()
            .await
            .bytecodes
            .insert(normalize_hex(bytecode), kind);
    }

    /// Credits native value to `account`.
    pub async fn fund(&self, account: EvmAddress, amount: u64) -> Result<(), ConnectorError> {
        self.state.lock().await.credit(account, amount)
    }

    pub async fn balance_of(&self, account: &EvmAddress) -> u64 {
        self.state.lock().await.balance_of(account)
    }

    /// Token balance, or `None` when `token` is not an ERC-20 contract.
    pub async fn token_balance_of(&self, token: &EvmAddress, account: &EvmAddress) -> Option<u64> {
        match self.state.lock().await.contracts.get(token) {
            Some(Program::Erc20Token(t)) => Some(t.balance_of(account)),
            _ => None,
        }
    }

    /// Events emitted by the contract at `address`, oldest first.
    pub async fn events(&self, address: &EvmAddress) -> Vec<HtlcEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.address == *address)
            .map(|e| e.event.clone())
            .collect()
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    fn receipt(
        tx_hash: String,
        block_number: u64,
        from: EvmAddress,
        to: Option<EvmAddress>,
        contract_address: Option<EvmAddress>,
        gas_used: u64,
    ) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: tx_hash,
            transaction_index: Some(0),
            block_hash: Some(Bytes32(keccak256(&uint_word(block_number.into()))).to_string()),
            block_number,
            from: from.to_string(),
            to: to.map(|a| a.to_string()),
            contract_address: contract_address.map(|a| a.to_string()),
            gas_used,
            status: true,
        }
    }
}

#[async_trait]
impl Web3Connector for DevLedger {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    async fn deploy_contract(
        &self,
        request: DeployContractRequest,
    ) -> Result<RunTransactionResponse, ConnectorError> {
        let sender = resolve_sender(&request.web3_signing_credential)?;
        let gas_used = check_gas(request.gas)?;

        let mut state = self.state.lock().await;
        let kind = *state
            .bytecodes
            .get(&normalize_hex(&request.bytecode))
            .ok_or_else(|| ConnectorError::Rejected("bytecode is not registered with this ledger".to_string()))?;

        let program = Program::instantiate(kind, sender, &request.constructor_args)?;
        let address = state.next_address(&sender);
        state.contracts.insert(address, program);
        state.block_number += 1;
        let block_number = state.block_number;
        let tx_hash = state.next_tx_hash(&sender);

        debug!(
            "dev ledger {}: deployed {:?} at {} (block {})",
            self.instance_id, kind, address, block_number
        );
        Ok(RunTransactionResponse {
            transaction_receipt: Self::receipt(tx_hash, block_number, sender, None, Some(address), gas_used),
        })
    }

    async fn invoke_contract(
        &self,
        request: InvokeContractRequest,
    ) -> Result<InvokeContractResponse, ConnectorError> {
        let address: EvmAddress = request.contract_address.parse().map_err(|e| {
            ConnectorError::Rejected(format!("invalid contract address {}: {}", request.contract_address, e))
        })?;
        let now = self.clock.now();

        match request.invocation_type {
            EthContractInvocationType::Call => {
                let caller = resolve_caller(&request.web3_signing_credential)?;
                let state = self.state.lock().await;
                let output = state.call(caller, now, address, &request.method_name, &request.params)?;
                Ok(InvokeContractResponse {
                    success: true,
                    call_output: Some(output),
                    transaction_receipt: None,
                })
            }
            EthContractInvocationType::Send => {
                let sender = resolve_sender(&request.web3_signing_credential)?;
                let gas_used = check_gas(request.gas)?;

                let mut state = self.state.lock().await;
                let mut next = state.clone();
                next.block_number += 1;
                let tx = Tx {
                    sender,
                    value: request.value.unwrap_or(0),
                    now,
                    block_number: next.block_number,
                };

                if let Err(e) = next.send(&tx, address, &request.method_name, &request.params) {
                    warn!(
                        "dev ledger {}: {}.{} from {} failed: {}",
                        self.instance_id, address, request.method_name, sender, e
                    );
                    return Err(e);
                }

                let tx_hash = next.next_tx_hash(&sender);
                let block_number = next.block_number;
                let emitted = std::mem::take(&mut next.pending_events);
                *state = next;
                self.events.lock().await.extend(emitted);

                debug!(
                    "dev ledger {}: {}.{} from {} (block {})",
                    self.instance_id, address, request.method_name, sender, block_number
                );
                Ok(InvokeContractResponse {
                    success: true,
                    call_output: None,
                    transaction_receipt: Some(Self::receipt(
                        tx_hash,
                        block_number,
                        sender,
                        Some(address),
                        None,
                        gas_used,
                    )),
                })
            }
        }
    }
}
