//! Dual-mode rebasing balance ledger.
//!
//! Balances are stored as credits. Rebasing accounts convert credits to
//! tokens through one global rate, so changing total supply is a single rate
//! update. Non-rebasing accounts freeze their own rate and keep a fixed
//! balance across supply changes.

pub mod account;
pub mod allowance;
pub mod config;
pub mod error;
pub mod event;
pub mod ledger;
pub mod math;
pub mod roles;
pub mod snapshot;

pub use account::Account;
pub use allowance::Allowances;
pub use config::LedgerConfig;
pub use error::LedgerError;
pub use event::{EventLog, LedgerEvent};
pub use ledger::RebasingLedger;
pub use math::{INITIAL_CREDITS_PER_TOKEN, MAX_SUPPLY, PRECISION, RESOLUTION_INCREASE};
pub use roles::{Capability, Role, RoleTable};
pub use snapshot::{AllowanceEntry, LedgerSnapshot, SNAPSHOT_VERSION};
