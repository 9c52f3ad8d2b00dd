//! Shared utilities for the rebasing ledger tools.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingError};
