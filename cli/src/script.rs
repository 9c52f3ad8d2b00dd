//! Operation scripts: a TOML list of `[[step]]` tables replayed in order.
//!
//! ```toml
//! [[step]]
//! op = "mint"
//! caller = "0x…"
//! to = "0x…"
//! amount = "100.5"
//! ```
//!
//! Amounts are whole-token decimal strings scaled by the ledger's decimals.

use anyhow::{bail, Context};
use rebase_ledger::{Capability, LedgerConfig, LedgerError, LedgerEvent, RebasingLedger, Role};
use rebase_types::{parse_units, Address};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Ledger setup used when no `--config` file is given.
    #[serde(default)]
    pub config: Option<LedgerConfig>,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Mint {
        caller: Address,
        to: Address,
        amount: String,
    },
    Burn {
        caller: Address,
        from: Address,
        amount: String,
    },
    Transfer {
        from: Address,
        to: Address,
        amount: String,
    },
    TransferFrom {
        spender: Address,
        from: Address,
        to: Address,
        amount: String,
    },
    Approve {
        owner: Address,
        spender: Address,
        amount: String,
    },
    IncreaseAllowance {
        owner: Address,
        spender: Address,
        amount: String,
    },
    DecreaseAllowance {
        owner: Address,
        spender: Address,
        amount: String,
    },
    RebaseOptOut {
        caller: Address,
        account: Address,
    },
    RebaseOptIn {
        caller: Address,
        account: Address,
    },
    ChangeSupply {
        caller: Address,
        total_supply: String,
    },
    SetExchanger {
        caller: Address,
        holder: Address,
    },
    SetPayoutManager {
        caller: Address,
        holder: Address,
    },
}

impl Script {
    pub fn from_toml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing script {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// First capability `caller` can obtain among `roles`.
fn authorize_any(
    ledger: &RebasingLedger,
    caller: &Address,
    roles: &[Role],
) -> Result<Capability, LedgerError> {
    let mut last = None;
    for role in roles {
        match ledger.authorize(caller, *role) {
            Ok(cap) => return Ok(cap),
            Err(e) => last = Some(e),
        }
    }
    Err(last.unwrap_or(LedgerError::Unauthorized {
        caller: *caller,
        role: Role::Admin,
    }))
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Burn { .. } => "burn",
            Self::Transfer { .. } => "transfer",
            Self::TransferFrom { .. } => "transfer_from",
            Self::Approve { .. } => "approve",
            Self::IncreaseAllowance { .. } => "increase_allowance",
            Self::DecreaseAllowance { .. } => "decrease_allowance",
            Self::RebaseOptOut { .. } => "rebase_opt_out",
            Self::RebaseOptIn { .. } => "rebase_opt_in",
            Self::ChangeSupply { .. } => "change_supply",
            Self::SetExchanger { .. } => "set_exchanger",
            Self::SetPayoutManager { .. } => "set_payout_manager",
        }
    }

    pub fn apply(&self, ledger: &mut RebasingLedger) -> anyhow::Result<()> {
        let decimals = ledger.decimals();
        let units = |s: &str| {
            parse_units(s, decimals).with_context(|| format!("amount {s:?}"))
        };

        match self {
            Self::Mint { caller, to, amount } => {
                let cap = ledger.authorize(caller, Role::Exchanger)?;
                ledger.mint(&cap, to, units(amount)?)?;
            }
            Self::Burn {
                caller,
                from,
                amount,
            } => {
                let cap = ledger.authorize(caller, Role::Exchanger)?;
                ledger.burn(&cap, from, units(amount)?)?;
            }
            Self::Transfer { from, to, amount } => {
                ledger.transfer(from, to, units(amount)?)?;
            }
            Self::TransferFrom {
                spender,
                from,
                to,
                amount,
            } => {
                ledger.transfer_from(spender, from, to, units(amount)?)?;
            }
            Self::Approve {
                owner,
                spender,
                amount,
            } => {
                ledger.approve(owner, spender, units(amount)?)?;
            }
            Self::IncreaseAllowance {
                owner,
                spender,
                amount,
            } => {
                ledger.increase_allowance(owner, spender, units(amount)?)?;
            }
            Self::DecreaseAllowance {
                owner,
                spender,
                amount,
            } => {
                ledger.decrease_allowance(owner, spender, units(amount)?)?;
            }
            Self::RebaseOptOut { caller, account } => {
                let cap = authorize_any(ledger, caller, &[Role::PayoutManager, Role::Admin])?;
                ledger.rebase_opt_out(&cap, account)?;
            }
            Self::RebaseOptIn { caller, account } => {
                let cap = authorize_any(ledger, caller, &[Role::PayoutManager, Role::Admin])?;
                ledger.rebase_opt_in(&cap, account)?;
            }
            Self::ChangeSupply {
                caller,
                total_supply,
            } => {
                let cap =
                    authorize_any(ledger, caller, &[Role::PayoutManager, Role::Exchanger])?;
                ledger.change_supply(&cap, units(total_supply)?)?;
            }
            Self::SetExchanger { caller, holder } => {
                let cap = ledger.authorize(caller, Role::Admin)?;
                ledger.set_exchanger(&cap, *holder)?;
            }
            Self::SetPayoutManager { caller, holder } => {
                let cap = ledger.authorize(caller, Role::Admin)?;
                ledger.set_payout_manager(&cap, *holder)?;
            }
        }
        Ok(())
    }
}

/// Build a ledger from `config` and apply every step, stopping at the first
/// failure.
///
/// The ledger's event log is drained after each step, so the returned ledger
/// holds no pending events and the second value carries all of them in order.
pub fn replay(
    config: LedgerConfig,
    steps: &[Step],
) -> anyhow::Result<(RebasingLedger, Vec<LedgerEvent>)> {
    let mut ledger = RebasingLedger::new(config).context("creating ledger")?;
    let mut events = Vec::new();
    for (index, step) in steps.iter().enumerate() {
        step.apply(&mut ledger)
            .with_context(|| format!("step {} ({})", index + 1, step.name()))?;
        let emitted = ledger.drain_events();
        tracing::debug!(step = index + 1, op = step.name(), events = emitted.len(), "applied");
        events.extend(emitted);
    }
    Ok((ledger, events))
}

/// Pick the ledger configuration: an explicit file wins over the script's
/// embedded table.
pub fn resolve_config(
    file: Option<LedgerConfig>,
    script: &Script,
) -> anyhow::Result<LedgerConfig> {
    match (file, &script.config) {
        (Some(config), _) => Ok(config),
        (None, Some(config)) => Ok(config.clone()),
        (None, None) => bail!("no ledger configuration: pass --config or add a [config] table"),
    }
}
