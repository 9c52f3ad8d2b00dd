//! Spending allowances keyed by (owner, spender).

use rebase_types::Address;
use std::collections::HashMap;

use crate::error::LedgerError;

/// Remaining spendable amounts. Absent entries are zero.
#[derive(Clone, Debug, Default)]
pub struct Allowances {
    entries: HashMap<(Address, Address), u128>,
}

impl Allowances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: &Address, spender: &Address) -> u128 {
        self.entries.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Overwrite the allowance.
    pub fn set(&mut self, owner: Address, spender: Address, amount: u128) {
        if amount == 0 {
            self.entries.remove(&(owner, spender));
        } else {
            self.entries.insert((owner, spender), amount);
        }
    }

    /// Add to the allowance, returning the new value.
    pub fn increase(
        &mut self,
        owner: Address,
        spender: Address,
        amount: u128,
    ) -> Result<u128, LedgerError> {
        let updated = self
            .get(&owner, &spender)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.set(owner, spender, updated);
        Ok(updated)
    }

    /// Subtract from the allowance, clamping at zero. Returns the new value.
    pub fn decrease(&mut self, owner: Address, spender: Address, amount: u128) -> u128 {
        let updated = self.get(&owner, &spender).saturating_sub(amount);
        self.set(owner, spender, updated);
        updated
    }

    /// Fail unless at least `amount` may be spent.
    pub fn ensure(&self, owner: &Address, spender: &Address, amount: u128) -> Result<(), LedgerError> {
        let available = self.get(owner, spender);
        if available < amount {
            return Err(LedgerError::InsufficientAllowance {
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(Address, Address), &u128)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
