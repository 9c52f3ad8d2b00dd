//! Token parameters fixed at ledger creation.

use crate::amount::{unit_scale, MAX_DECIMALS};
use crate::error::TypesError;
use serde::{Deserialize, Serialize};

/// Descriptive token metadata.
///
/// `decimals` is fixed for the lifetime of a ledger: every external amount is
/// an integer scaled by `10^decimals`, while credit arithmetic always runs at
/// 1e18 regardless.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenParams {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_name() -> String {
    "USD+".to_string()
}

fn default_symbol() -> String {
    "USD+".to_string()
}

fn default_decimals() -> u8 {
    6
}

impl TokenParams {
    /// The USD+ profile: 6 decimals.
    pub fn usd_plus() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
        }
    }

    /// An 18-decimal profile, as deployed on chains whose base stablecoin
    /// uses 18 decimals.
    pub fn with_decimals(decimals: u8) -> Self {
        Self {
            decimals,
            ..Self::usd_plus()
        }
    }

    pub fn validate(&self) -> Result<(), TypesError> {
        if self.decimals > MAX_DECIMALS {
            return Err(TypesError::InvalidDecimals {
                got: self.decimals,
                max: MAX_DECIMALS,
            });
        }
        Ok(())
    }

    /// One whole token in raw units.
    pub fn one(&self) -> Result<u128, TypesError> {
        unit_scale(self.decimals)
    }
}

/// Default is the USD+ profile.
impl Default for TokenParams {
    fn default() -> Self {
        Self::usd_plus()
    }
}
