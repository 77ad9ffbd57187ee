//! # Held Funds
//!
//! The native-value balance table of the ledger. Payments attached to calls
//! move from the caller to the receiving component before the component
//! runs; payouts move out only after the component has finished mutating
//! its own state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::DcnsError;

/// Smallest unit of native value.
pub type Wei = u128;

/// Account → balance table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Funds {
    balances: BTreeMap<Address, Wei>,
}

impl Funds {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance held by `account`. Unknown accounts hold zero.
    pub fn balance_of(&self, account: Address) -> Wei {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Add newly issued value to `account` (genesis allocations, faucets).
    pub fn credit(&mut self, account: Address, amount: Wei) -> Result<(), DcnsError> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| DcnsError::InvalidInput(format!("balance of {account} overflows")))?;
        Ok(())
    }

    /// Move `amount` from `from` to `to`.
    pub fn transfer(&mut self, from: Address, to: Address, amount: Wei) -> Result<(), DcnsError> {
        if amount == 0 {
            return Ok(());
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(DcnsError::InsufficientPayment {
                required: amount,
                provided: available,
            });
        }
        self.balances.insert(from, available - amount);
        self.credit(to, amount)
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> Wei {
        self.balances.values().fold(0, |acc, b| acc.saturating_add(*b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_transfer_moves_value() {
        let mut funds = Funds::new();
        funds.credit(account(1), 100).unwrap();
        funds.transfer(account(1), account(2), 40).unwrap();
        assert_eq!(funds.balance_of(account(1)), 60);
        assert_eq!(funds.balance_of(account(2)), 40);
        assert_eq!(funds.total_supply(), 100);
    }

    #[test]
    fn test_transfer_rejects_overdraft() {
        let mut funds = Funds::new();
        funds.credit(account(1), 10).unwrap();
        let err = funds.transfer(account(1), account(2), 11).unwrap_err();
        assert_eq!(
            err,
            DcnsError::InsufficientPayment {
                required: 11,
                provided: 10
            }
        );
        assert_eq!(funds.balance_of(account(1)), 10);
    }

    #[test]
    fn test_zero_transfer_is_noop() {
        let mut funds = Funds::new();
        funds.transfer(account(1), account(2), 0).unwrap();
        assert_eq!(funds.balance_of(account(2)), 0);
    }
}
