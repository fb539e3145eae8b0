//! Currency collaborator used by upgrades.
use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EconomyError {
    #[error("the currency service is unavailable")]
    Unavailable,

    #[error("balance {balance:.2} does not cover {amount:.2}")]
    InsufficientFunds { balance: f64, amount: f64 },
}

/// Balance queries and withdrawals against the host's currency service.
pub trait Economy {
    fn has(&self, player: Uuid, amount: f64) -> Result<bool, EconomyError>;

    fn withdraw(&mut self, player: Uuid, amount: f64) -> Result<(), EconomyError>;
}

/// Ledger kept in memory; unknown players have a zero balance.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEconomy {
    balances: HashMap<Uuid, f64>,
}

impl InMemoryEconomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, player: Uuid, amount: f64) -> Self {
        self.deposit(player, amount);
        self
    }

    pub fn balance(&self, player: Uuid) -> f64 {
        self.balances.get(&player).copied().unwrap_or(0.0)
    }

    pub fn deposit(&mut self, player: Uuid, amount: f64) {
        *self.balances.entry(player).or_insert(0.0) += amount;
    }
}

impl Economy for InMemoryEconomy {
    fn has(&self, player: Uuid, amount: f64) -> Result<bool, EconomyError> {
        Ok(self.balance(player) >= amount)
    }

    fn withdraw(&mut self, player: Uuid, amount: f64) -> Result<(), EconomyError> {
        let balance = self.balance(player);
        if balance < amount {
            return Err(EconomyError::InsufficientFunds { balance, amount });
        }
        self.balances.insert(player, balance - amount);
        Ok(())
    }
}
