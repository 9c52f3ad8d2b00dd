//! Errors raised while parsing or validating shared types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("token decimals must be at most {max}, got {got}")]
    InvalidDecimals { got: u8, max: u8 },

    #[error("amount overflows 128 bits")]
    Overflow,
}
