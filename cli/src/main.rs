//! hive: replay ledger scenarios and inspect snapshots.

mod config;
mod error;
mod report;
mod scenario;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use hive_accrual::Hive;
use hive_nullables::{NullClock, NullTransfer};
use hive_store::LedgerSnapshot;
use hive_types::Timestamp;
use hive_utils::LogFormat;

use crate::config::HiveConfig;
use crate::report::{ledger_view, to_json, InspectReport};
use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "hive", about = "Time-weighted value-pooling ledger simulator")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter: "trace", "debug", "info", "warn", "error".
    #[arg(long, global = true, env = "HIVE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: "human" or "json".
    #[arg(long, global = true, env = "HIVE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Print compact single-line JSON.
    #[arg(long, global = true, env = "HIVE_COMPACT")]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a scenario file and print the resulting ledger.
    Run {
        scenario: PathBuf,

        /// Write the final ledger snapshot here.
        #[arg(long)]
        save: Option<PathBuf>,

        /// Clock value for scenarios that do not set `start`.
        #[arg(long, env = "HIVE_START_TIME")]
        start: Option<u64>,
    },
    /// Verify a snapshot file and print its contents.
    Inspect {
        snapshot: PathBuf,

        /// Report accrued shares at this time instead of the snapshot's
        /// latest time.
        #[arg(long)]
        at: Option<u64>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => HiveConfig::from_toml_file(path)?,
        None => HiveConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if cli.compact {
        config.pretty = false;
    }

    hive_utils::init_logging(config.log_format, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::Run {
            scenario,
            save,
            start,
        } => {
            if let Some(start) = start {
                config.start_time = start;
            }
            let outcome = Scenario::from_toml_file(&scenario)?.run(config.start_time)?;

            if let Some(path) = save.or(config.snapshot_path.clone()) {
                outcome
                    .snapshot
                    .write_to(&path)
                    .with_context(|| format!("writing snapshot to {}", path.display()))?;
                tracing::info!(hash = %outcome.snapshot.hash_hex(), "snapshot saved to {}", path.display());
            }
            println!("{}", to_json(&outcome.report, config.pretty)?);
        }
        Command::Inspect { snapshot, at } => {
            let snap = LedgerSnapshot::read_from(&snapshot)
                .with_context(|| format!("reading snapshot {}", snapshot.display()))?;
            if !snap.verify() {
                bail!("snapshot {} failed hash verification", snapshot.display());
            }

            let latest = snap.latest_time.unwrap_or(Timestamp::EPOCH);
            let at = at.map(Timestamp::new).unwrap_or(latest);
            if at < latest {
                bail!("--at {at} precedes the snapshot's latest time {latest}");
            }

            let clock = NullClock::new(at.as_secs());
            let transfer = NullTransfer::new();
            let hive = Hive::from_snapshot(&snap, &clock, &transfer)?;
            let (pools, stakes) = ledger_view(&hive, at)?;
            let report = InspectReport {
                hash: snap.hash_hex(),
                version: snap.version,
                latest_time: snap.latest_time,
                at,
                pools,
                stakes,
            };
            println!("{}", to_json(&report, config.pretty)?);
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
