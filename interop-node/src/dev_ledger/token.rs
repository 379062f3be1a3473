use chain_clients_common::EvmAddress;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("INSUFFICIENT_BALANCE")]
    InsufficientBalance,
    #[error("INSUFFICIENT_ALLOWANCE")]
    InsufficientAllowance,
    #[error("BALANCE_OVERFLOW")]
    BalanceOverflow,
}

/// Minimal ERC-20 ledger: balances, allowances and a fixed supply minted at
/// deployment.
#[derive(Debug, Clone, Default)]
pub struct Erc20Token {
    total_supply: u64,
    balances: HashMap<EvmAddress, u64>,
    allowances: HashMap<(EvmAddress, EvmAddress), u64>,
}

impl Erc20Token {
    pub fn new(owner: EvmAddress, initial_supply: u64) -> Self {
        let mut balances = HashMap::new();
        balances.insert(owner, initial_supply);
        Self {
            total_supply: initial_supply,
            balances,
            allowances: HashMap::new(),
        }
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn balance_of(&self, account: &EvmAddress) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &EvmAddress, spender: &EvmAddress) -> u64 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    pub fn approve(&mut self, owner: EvmAddress, spender: EvmAddress, amount: u64) {
        self.allowances.insert((owner, spender), amount);
    }

    pub fn transfer(&mut self, from: EvmAddress, to: EvmAddress, amount: u64) -> Result<(), TokenError> {
        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance);
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(TokenError::BalanceOverflow)?;
        self.balances.insert(from, from_balance - amount);
        self.balances.insert(to, to_balance);
        Ok(())
    }

    /// Moves `amount` from `owner` to `to` on behalf of `spender`, consuming
    /// allowance.
    pub fn transfer_from(
        &mut self,
        spender: EvmAddress,
        owner: EvmAddress,
        to: EvmAddress,
        amount: u64,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(&owner, &spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance);
        }
        self.transfer(owner, to, amount)?;
        self.allowances.insert((owner, spender), allowed - amount);
        Ok(())
    }
}
