//! Per-account credit position.

use rebase_types::RebaseState;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::math::{self, PRECISION};

/// An account's holding, tagged by rebase mode.
///
/// Rebasing accounts store only credits and read the global rate.
/// Non-rebasing accounts carry their own frozen rate; `None` means it has
/// not been set yet and the 1:1 default applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Account {
    Rebasing {
        credits: u128,
    },
    NonRebasing {
        credits: u128,
        credits_per_token: Option<u128>,
    },
}

impl Default for Account {
    fn default() -> Self {
        Self::Rebasing { credits: 0 }
    }
}

impl Account {
    /// A non-rebasing account with no balance and no rate yet.
    pub fn non_rebasing() -> Self {
        Self::NonRebasing {
            credits: 0,
            credits_per_token: None,
        }
    }

    pub fn credits(&self) -> u128 {
        match *self {
            Self::Rebasing { credits } | Self::NonRebasing { credits, .. } => credits,
        }
    }

    pub fn state(&self) -> RebaseState {
        match self {
            Self::Rebasing { .. } => RebaseState::Rebasing,
            Self::NonRebasing { .. } => RebaseState::NonRebasing,
        }
    }

    pub fn is_rebasing(&self) -> bool {
        matches!(self, Self::Rebasing { .. })
    }

    /// The rate this account's credits convert at.
    pub fn credits_per_token(&self, global: u128) -> u128 {
        match *self {
            Self::Rebasing { .. } => global,
            Self::NonRebasing {
                credits_per_token, ..
            } => credits_per_token.unwrap_or(PRECISION),
        }
    }

    pub fn balance_checked(&self, global: u128) -> Result<u128, LedgerError> {
        math::to_tokens(self.credits(), self.credits_per_token(global))
    }

    /// Token balance, returning 0 on overflow.
    pub fn balance(&self, global: u128) -> u128 {
        self.balance_checked(global).unwrap_or(0)
    }

    pub(crate) fn with_credits(self, credits: u128) -> Self {
        match self {
            Self::Rebasing { .. } => Self::Rebasing { credits },
            Self::NonRebasing {
                credits_per_token, ..
            } => Self::NonRebasing {
                credits,
                credits_per_token,
            },
        }
    }

    /// Freeze an unset private rate at `rate`. Rebasing accounts and accounts
    /// whose rate is already set are returned unchanged.
    pub(crate) fn with_rate_if_unset(self, rate: u128) -> Self {
        match self {
            Self::NonRebasing {
                credits,
                credits_per_token: None,
            } => Self::NonRebasing {
                credits,
                credits_per_token: Some(rate),
            },
            other => other,
        }
    }
}
