//! Ledger errors.
//!
//! Every variant is returned before any state is written, so a failed call
//! leaves the ledger exactly as it was.

use rebase_types::{Address, TypesError};
use thiserror::Error;

use crate::roles::Role;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("caller {caller} does not hold the {role} role")]
    Unauthorized { caller: Address, role: Role },

    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),

    #[error("insufficient balance: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, available {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    #[error("{0}")]
    InvalidState(&'static str),

    #[error("arithmetic overflow in ledger computation")]
    Overflow,

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl From<TypesError> for LedgerError {
    fn from(e: TypesError) -> Self {
        Self::Config(e.to_string())
    }
}
