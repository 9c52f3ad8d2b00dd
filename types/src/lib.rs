//! Fundamental types for the rebasing ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account addresses, token unit scaling, token parameters and the rebase state enum.

pub mod address;
pub mod amount;
pub mod error;
pub mod params;
pub mod state;

pub use address::Address;
pub use amount::{format_units, parse_units, unit_scale, MAX_DECIMALS};
pub use error::TypesError;
pub use params::TokenParams;
pub use state::RebaseState;
