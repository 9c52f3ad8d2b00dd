//! Rebasing ledger CLI: replay operation scripts and inspect snapshots.

mod report;
mod script;

use anyhow::Context;
use clap::Parser;
use rebase_ledger::{LedgerConfig, LedgerSnapshot, RebasingLedger};
use rebase_utils::LogFormat;
use std::path::{Path, PathBuf};

use crate::report::Report;
use crate::script::Script;

#[derive(Parser)]
#[command(name = "rebase-cli", about = "Rebasing balance ledger tools")]
struct Cli {
    /// Path to a TOML ledger configuration. Overrides a script's `[config]`.
    #[arg(long, env = "REBASE_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter: "trace", "debug", "info", "warn", "error" or a directive list.
    #[arg(long, default_value = "warn", env = "REBASE_LOG_LEVEL")]
    log_level: String,

    /// Log output format: "human" or "json".
    #[arg(long, default_value_t = LogFormat::Human, env = "REBASE_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Apply a script of operations to a fresh ledger and print the result.
    Replay {
        /// TOML file with `[[step]]` entries.
        #[arg(long)]
        script: PathBuf,

        /// Write the final state as a snapshot file.
        #[arg(long)]
        snapshot_out: Option<PathBuf>,
    },
    /// Print the state held in a snapshot file.
    Inspect {
        #[arg(long)]
        snapshot: PathBuf,
    },
}

fn load_snapshot(path: &Path) -> anyhow::Result<RebasingLedger> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot = LedgerSnapshot::from_bytes(&bytes)?;
    let ledger = RebasingLedger::from_snapshot(snapshot)
        .with_context(|| format!("restoring snapshot {}", path.display()))?;
    Ok(ledger)
}

fn write_snapshot(ledger: &RebasingLedger, path: &Path) -> anyhow::Result<()> {
    let snapshot = ledger.snapshot();
    std::fs::write(path, snapshot.to_bytes()?)
        .with_context(|| format!("writing snapshot {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        hash = %snapshot.hash_hex(),
        accounts = snapshot.account_count(),
        "snapshot written"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    rebase_utils::init_logging(cli.log_format, &cli.log_level)?;

    let file_config = match &cli.config {
        Some(path) => {
            let config = LedgerConfig::from_toml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            tracing::info!(path = %path.display(), "loaded config");
            Some(config)
        }
        None => None,
    };

    let report = match cli.command {
        Command::Replay {
            script,
            snapshot_out,
        } => {
            let script = Script::from_toml_file(&script)?;
            let config = script::resolve_config(file_config, &script)?;
            let (ledger, events) = script::replay(config, &script.steps)?;
            tracing::info!(
                steps = script.steps.len(),
                events = events.len(),
                total_supply = ledger.total_supply(),
                "replay finished"
            );
            if let Some(path) = snapshot_out {
                write_snapshot(&ledger, &path)?;
            }
            Report::from_ledger(&ledger, events)
        }
        Command::Inspect { snapshot } => {
            let ledger = load_snapshot(&snapshot)?;
            Report::from_ledger(&ledger, Vec::new())
        }
    };

    println!("{}", report.to_json()?);
    Ok(())
}
