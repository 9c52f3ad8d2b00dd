//! Rebase participation state of an account.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an account follows the global rebasing rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebaseState {
    /// Balance grows and shrinks with every supply change.
    #[default]
    Rebasing,
    /// Balance is frozen at a private rate and only moves on transfers.
    NonRebasing,
}

impl RebaseState {
    pub fn is_rebasing(&self) -> bool {
        matches!(self, Self::Rebasing)
    }
}

impl fmt::Display for RebaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rebasing => write!(f, "rebasing"),
            Self::NonRebasing => write!(f, "non_rebasing"),
        }
    }
}
