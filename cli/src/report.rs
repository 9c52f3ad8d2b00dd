//! JSON report of a ledger's state.

use rebase_ledger::{LedgerEvent, RebasingLedger};
use rebase_types::{format_units, Address, RebaseState};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Report {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Whole-token decimal string.
    pub total_supply: String,
    pub non_rebasing_supply: String,
    /// Raw credits, as a decimal string.
    pub rebasing_credits: String,
    /// Global rate at 1e18 scale, as a decimal string.
    pub rebasing_credits_per_token: String,
    pub snapshot_hash: String,
    pub accounts: Vec<AccountReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<LedgerEvent>,
}

#[derive(Debug, Serialize)]
pub struct AccountReport {
    pub address: Address,
    pub mode: RebaseState,
    pub balance: String,
    pub credits: String,
    pub credits_per_token: String,
}

impl Report {
    pub fn from_ledger(ledger: &RebasingLedger, events: Vec<LedgerEvent>) -> Self {
        let decimals = ledger.decimals();
        let snapshot = ledger.snapshot();

        let accounts = snapshot
            .accounts
            .iter()
            .map(|(address, _)| {
                let (credits, credits_per_token) = ledger.credits_balance_of(address);
                AccountReport {
                    address: *address,
                    mode: ledger.rebase_state(address),
                    balance: format_units(ledger.balance_of(address), decimals),
                    credits: credits.to_string(),
                    credits_per_token: credits_per_token.to_string(),
                }
            })
            .collect();

        Self {
            name: ledger.name().to_string(),
            symbol: ledger.symbol().to_string(),
            decimals,
            total_supply: format_units(ledger.total_supply(), decimals),
            non_rebasing_supply: format_units(ledger.non_rebasing_supply(), decimals),
            rebasing_credits: ledger.rebasing_credits_highres().to_string(),
            rebasing_credits_per_token: ledger.rebasing_credits_per_token_highres().to_string(),
            snapshot_hash: snapshot.hash_hex(),
            accounts,
            events,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
