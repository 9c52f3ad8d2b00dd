//! Structured logging initialisation.
//!
//! Two output formats are supported:
//! - [`LogFormat::Human`]: readable lines for a terminal.
//! - [`LogFormat::Json`]: newline-delimited JSON for log aggregation.
//!
//! `RUST_LOG` overrides the caller-supplied `level` string when set
//! (e.g. `"info"`, `"warn,rebase_ledger=trace"`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{fmt as layer_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unknown log format {0:?} (expected \"human\" or \"json\")")]
    UnknownFormat(String),

    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|e| LoggingError::Filter(e.to_string())),
    }
}

/// Install the global tracing subscriber. Logs go to stderr so stdout stays
/// free for command output.
pub fn init_logging(format: LogFormat, level: &str) -> Result<(), LoggingError> {
    let filter = build_filter(level)?;

    let result = match format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(
                layer_fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                layer_fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init(),
    };
    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
    tracing::debug!(%format, level, "logging initialised");
    Ok(())
}
