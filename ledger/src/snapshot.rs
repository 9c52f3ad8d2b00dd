//! Ledger snapshots: the full state of a ledger at a point in time.
//!
//! A snapshot carries a Blake2b hash over its contents so a restored ledger
//! can be checked before use. Accounts and allowances are sorted by address,
//! which makes the hash independent of map iteration order.

use rebase_types::{Address, TokenParams};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::account::Account;
use crate::allowance::Allowances;
use crate::error::LedgerError;
use crate::ledger::RebasingLedger;
use crate::roles::{Role, RoleTable};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Blake2b-256 over every other field.
    pub hash: [u8; 32],
    pub version: u32,
    pub params: TokenParams,
    pub roles: RoleTable,
    pub accounts: Vec<(Address, Account)>,
    pub allowances: Vec<AllowanceEntry>,
    pub rebasing_credits: u128,
    pub rebasing_credits_per_token: u128,
    pub non_rebasing_supply: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEntry {
    pub owner: Address,
    pub spender: Address,
    pub amount: u128,
}

impl LedgerSnapshot {
    fn compute_hash(&self) -> [u8; 32] {
        use blake2::digest::consts::U32;
        use blake2::{Blake2b, Digest};

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.params.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.params.symbol.as_bytes());
        hasher.update([0u8]);
        hasher.update([self.params.decimals]);
        for role in [Role::Admin, Role::Exchanger, Role::PayoutManager] {
            match self.roles.holder(role) {
                Some(holder) => {
                    hasher.update([1u8]);
                    hasher.update(holder.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        for (address, account) in &self.accounts {
            hasher.update(address.as_bytes());
            match *account {
                Account::Rebasing { credits } => {
                    hasher.update([0u8]);
                    hasher.update(credits.to_le_bytes());
                }
                Account::NonRebasing {
                    credits,
                    credits_per_token,
                } => {
                    hasher.update([1u8]);
                    hasher.update(credits.to_le_bytes());
                    hasher.update(credits_per_token.unwrap_or(0).to_le_bytes());
                }
            }
        }
        for entry in &self.allowances {
            hasher.update(entry.owner.as_bytes());
            hasher.update(entry.spender.as_bytes());
            hasher.update(entry.amount.to_le_bytes());
        }
        hasher.update(self.rebasing_credits.to_le_bytes());
        hasher.update(self.rebasing_credits_per_token.to_le_bytes());
        hasher.update(self.non_rebasing_supply.to_le_bytes());

        let result = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&result);
        out
    }

    /// Check the hash against the contents.
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        bincode::serialize(self).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        bincode::deserialize(bytes).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

impl RebasingLedger {
    /// Capture the full ledger state. Pending events are not included.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut accounts: Vec<(Address, Account)> =
            self.accounts().map(|(a, acc)| (*a, *acc)).collect();
        accounts.sort_by_key(|(address, _)| *address);

        let mut allowances: Vec<AllowanceEntry> = self
            .allowance_entries()
            .iter()
            .map(|((owner, spender), amount)| AllowanceEntry {
                owner: *owner,
                spender: *spender,
                amount: *amount,
            })
            .collect();
        allowances.sort_by_key(|e| (e.owner, e.spender));

        let mut snap = LedgerSnapshot {
            hash: [0u8; 32],
            version: SNAPSHOT_VERSION,
            params: self.params().clone(),
            roles: self.roles().clone(),
            accounts,
            allowances,
            rebasing_credits: self.rebasing_credits_highres(),
            rebasing_credits_per_token: self.rebasing_credits_per_token_highres(),
            non_rebasing_supply: self.non_rebasing_supply(),
        };
        snap.hash = snap.compute_hash();
        snap
    }

    /// Rebuild a ledger from a snapshot, rejecting any snapshot whose hash
    /// or internal bookkeeping does not check out.
    pub fn from_snapshot(snap: LedgerSnapshot) -> Result<Self, LedgerError> {
        if snap.version != SNAPSHOT_VERSION {
            return Err(LedgerError::Snapshot(format!(
                "unsupported snapshot version {}",
                snap.version
            )));
        }
        if !snap.verify() {
            return Err(LedgerError::Snapshot("hash mismatch".into()));
        }
        snap.params.validate()?;
        if snap.rebasing_credits_per_token == 0 {
            return Err(LedgerError::Snapshot("zero rebasing rate".into()));
        }

        let mut accounts = HashMap::with_capacity(snap.accounts.len());
        let mut rebasing_sum: u128 = 0;
        let mut fixed_sum: u128 = 0;
        for (address, account) in snap.accounts {
            if address.is_zero() {
                return Err(LedgerError::Snapshot("zero address holds a position".into()));
            }
            if account.is_rebasing() {
                rebasing_sum = rebasing_sum
                    .checked_add(account.credits())
                    .ok_or(LedgerError::Overflow)?;
            } else {
                fixed_sum = fixed_sum
                    .checked_add(account.balance_checked(snap.rebasing_credits_per_token)?)
                    .ok_or(LedgerError::Overflow)?;
            }
            if accounts.insert(address, account).is_some() {
                return Err(LedgerError::Snapshot(format!("duplicate account {address}")));
            }
        }
        if rebasing_sum != snap.rebasing_credits {
            return Err(LedgerError::Snapshot(format!(
                "rebasing credits {} do not match account sum {rebasing_sum}",
                snap.rebasing_credits
            )));
        }
        if fixed_sum != snap.non_rebasing_supply {
            return Err(LedgerError::Snapshot(format!(
                "non-rebasing supply {} does not match account sum {fixed_sum}",
                snap.non_rebasing_supply
            )));
        }

        let mut allowances = Allowances::new();
        for entry in snap.allowances {
            allowances.set(entry.owner, entry.spender, entry.amount);
        }

        let ledger = RebasingLedger::from_parts(
            snap.params,
            snap.roles,
            accounts,
            allowances,
            snap.rebasing_credits,
            snap.rebasing_credits_per_token,
            snap.non_rebasing_supply,
        );
        ledger.total_supply_checked()?;
        tracing::info!(
            accounts = ledger.accounts().count(),
            total_supply = ledger.total_supply(),
            "ledger restored from snapshot"
        );
        Ok(ledger)
    }
}
