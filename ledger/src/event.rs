//! Events emitted by ledger operations.

use rebase_types::Address;
use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// Observable effects of a committed call, in emission order.
///
/// Mints are reported as transfers from the zero address and burns as
/// transfers to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    Transfer {
        from: Address,
        to: Address,
        amount: u128,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: u128,
    },
    RebaseOptIn {
        account: Address,
    },
    RebaseOptOut {
        account: Address,
    },
    SupplyChanged {
        total_supply: u128,
        rebasing_credits: u128,
        rebasing_credits_per_token: u128,
    },
    RoleAssigned {
        role: Role,
        holder: Address,
    },
}

/// Append-only buffer the host drains after each call.
///
/// Nothing is dropped: a host that never drains keeps every event in memory.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    pending: Vec<LedgerEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: LedgerEvent) {
        self.pending.push(event);
    }

    /// Take every event emitted since the last drain.
    pub fn drain(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[LedgerEvent] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_log() {
        let mut log = EventLog::new();
        log.push(LedgerEvent::RebaseOptOut {
            account: Address::from_low_u64(1),
        });
        assert_eq!(log.pending().len(), 1);
        assert_eq!(log.drain().len(), 1);
        assert!(log.pending().is_empty());
    }
}
