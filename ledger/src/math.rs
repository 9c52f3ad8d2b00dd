//! Fixed-point conversions between token space and credit space.
//!
//! Rates are credits-per-token at scale 1e18. Multiplying a `u128` amount by
//! a rate can exceed 128 bits, so every product is formed in `U256` and only
//! narrowed back after the division.
//!
//! The rebasing pool starts at [`INITIAL_CREDITS_PER_TOKEN`], 1e9 credits per
//! base unit, so a single credit stays far below one base unit across any
//! realistic supply expansion and conversions round by fractions of a unit.

use ethnum::U256;

use crate::error::LedgerError;

/// Fixed-point scale of every rate (1 credit per token).
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Extra credit resolution of the rebasing pool over a 1:1 rate.
pub const RESOLUTION_INCREASE: u128 = 1_000_000_000;

/// Global rate of a fresh ledger.
pub const INITIAL_CREDITS_PER_TOKEN: u128 = PRECISION * RESOLUTION_INCREASE;

/// Upper bound on total supply.
pub const MAX_SUPPLY: u128 = u128::MAX;

fn narrow(value: U256) -> Result<u128, LedgerError> {
    if value > U256::new(u128::MAX) {
        return Err(LedgerError::Overflow);
    }
    Ok(value.as_u128())
}

/// `a * b / denominator`, floored.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, LedgerError> {
    if denominator == 0 {
        return Err(LedgerError::Overflow);
    }
    let product = U256::new(a) * U256::new(b);
    narrow(product / U256::new(denominator))
}

/// `a * b / denominator`, rounded up.
pub fn mul_div_ceil(a: u128, b: u128, denominator: u128) -> Result<u128, LedgerError> {
    if denominator == 0 {
        return Err(LedgerError::Overflow);
    }
    let product = U256::new(a) * U256::new(b);
    let d = U256::new(denominator);
    let mut quotient = product / d;
    if product % d != U256::ZERO {
        quotient += U256::ONE;
    }
    narrow(quotient)
}

/// Token amount → credits at `credits_per_token` (floor).
pub fn to_credits(amount: u128, credits_per_token: u128) -> Result<u128, LedgerError> {
    mul_div(amount, credits_per_token, PRECISION)
}

/// Token amount → credits at `credits_per_token`, rounded up. Used on debit
/// paths so the payer always gives up at least `amount`.
pub fn to_credits_ceil(amount: u128, credits_per_token: u128) -> Result<u128, LedgerError> {
    mul_div_ceil(amount, credits_per_token, PRECISION)
}

/// Credits → token amount at `credits_per_token` (floor).
pub fn to_tokens(credits: u128, credits_per_token: u128) -> Result<u128, LedgerError> {
    mul_div(credits, PRECISION, credits_per_token)
}

/// Credits → token amount at `credits_per_token`, rounded up.
pub fn to_tokens_ceil(credits: u128, credits_per_token: u128) -> Result<u128, LedgerError> {
    mul_div_ceil(credits, PRECISION, credits_per_token)
}
