//! Ledger configuration with TOML file support.

use rebase_types::{Address, TokenParams};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::LedgerError;

/// Everything needed to create a ledger.
///
/// Can be loaded from a TOML file via [`LedgerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Holder of the admin role.
    pub admin: Address,

    /// Initial exchanger, if known at creation.
    #[serde(default)]
    pub exchanger: Option<Address>,

    /// Initial payout manager, if known at creation.
    #[serde(default)]
    pub payout_manager: Option<Address>,

    /// Accounts that start out non-rebasing with an unset rate
    /// (pools and other integrations that cannot tolerate rebases).
    #[serde(default)]
    pub non_rebasing: Vec<Address>,

    /// Token metadata; decimals are fixed for the ledger's lifetime.
    #[serde(default)]
    pub token: TokenParams,
}

impl LedgerConfig {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            exchanger: None,
            payout_manager: None,
            non_rebasing: Vec::new(),
            token: TokenParams::default(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LedgerError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LedgerError> {
        toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, LedgerError> {
        toml::to_string_pretty(self).map_err(|e| LedgerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        self.token.validate()?;
        if self.admin.is_zero() {
            return Err(LedgerError::Config("admin must not be the zero address".into()));
        }
        if self.non_rebasing.iter().any(Address::is_zero) {
            return Err(LedgerError::Config(
                "the zero address cannot be listed as non-rebasing".into(),
            ));
        }
        Ok(())
    }
}
