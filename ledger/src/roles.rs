//! Role table and capability tokens for privileged operations.
//!
//! A caller first exchanges its address for a [`Capability`] via
//! [`RoleTable::authorize`]. Privileged ledger calls take the capability and
//! re-check it against the table, so reassigning a role invalidates every
//! capability issued to the previous holder.

use rebase_types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LedgerError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Assigns the other roles.
    Admin,
    /// Mints, burns and changes supply.
    Exchanger,
    /// Changes supply on a payout schedule and manages rebase opt-in/opt-out.
    PayoutManager,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Exchanger => write!(f, "exchanger"),
            Self::PayoutManager => write!(f, "payout manager"),
        }
    }
}

/// Proof that `holder` held `role` when it was issued.
///
/// Only [`RoleTable::authorize`] constructs one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capability {
    role: Role,
    holder: Address,
}

impl Capability {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn holder(&self) -> &Address {
        &self.holder
    }
}

/// Current holder of each role. Unassigned roles have no holder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTable {
    admin: Address,
    exchanger: Option<Address>,
    payout_manager: Option<Address>,
}

impl RoleTable {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            exchanger: None,
            payout_manager: None,
        }
    }

    pub fn holder(&self, role: Role) -> Option<&Address> {
        match role {
            Role::Admin => Some(&self.admin),
            Role::Exchanger => self.exchanger.as_ref(),
            Role::PayoutManager => self.payout_manager.as_ref(),
        }
    }

    /// Issue a capability if `caller` currently holds `role`.
    pub fn authorize(&self, caller: &Address, role: Role) -> Result<Capability, LedgerError> {
        match self.holder(role) {
            Some(holder) if holder == caller && !caller.is_zero() => Ok(Capability {
                role,
                holder: *caller,
            }),
            _ => Err(LedgerError::Unauthorized {
                caller: *caller,
                role,
            }),
        }
    }

    /// Accept `cap` if it grants one of `allowed` and its holder still holds it.
    pub fn check(&self, cap: &Capability, allowed: &[Role]) -> Result<(), LedgerError> {
        let still_held = self.holder(cap.role) == Some(&cap.holder);
        if allowed.contains(&cap.role) && still_held {
            return Ok(());
        }
        Err(LedgerError::Unauthorized {
            caller: cap.holder,
            role: allowed.first().copied().unwrap_or(cap.role),
        })
    }

    pub(crate) fn assign(&mut self, role: Role, holder: Address) {
        match role {
            Role::Admin => self.admin = holder,
            Role::Exchanger => self.exchanger = Some(holder),
            Role::PayoutManager => self.payout_manager = Some(holder),
        }
    }
}
