use crate::core::{EngineConfig, OverdraftPolicy};
use crate::strategy::{BatchConfig, Report};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;

/// Process transfer instructions against the account ledger
#[derive(Parser, Debug)]
#[command(name = "ledger-engine")]
#[command(about = "Process transfer instructions against the account ledger", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing batch instructions
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy to use for the batch
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Number of instructions per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of instructions per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of concurrent transfer runs (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of transfer runs processing concurrently (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Bound on the wait for each account row lock, in milliseconds
    #[arg(
        long = "lock-wait-ms",
        value_name = "MILLIS",
        help = "Milliseconds to wait for an account row lock before giving up (default: 500)"
    )]
    pub lock_wait_ms: Option<u64>,

    /// Reject transfers that would leave the source balance below this floor
    #[arg(
        long = "overdraft-floor",
        value_name = "AMOUNT",
        allow_hyphen_values = true,
        help = "Balance floor for source accounts; without it negative balances are allowed"
    )]
    pub overdraft_floor: Option<Decimal>,

    /// Write a statement for one account instead of the balances report
    #[arg(
        long = "statement",
        value_name = "RIB",
        help = "Write the ledger entries of this account instead of the balances report"
    )]
    pub statement: Option<String>,

    /// Start of the statement date window (inclusive)
    #[arg(
        long = "date-from",
        value_name = "DATETIME",
        help = "Only statement entries at or after this RFC 3339 instant (e.g. 2026-03-05T00:00:00Z)"
    )]
    pub date_from: Option<DateTime<Utc>>,

    /// End of the statement date window (inclusive)
    #[arg(
        long = "date-to",
        value_name = "DATETIME",
        help = "Only statement entries at or before this RFC 3339 instant"
    )]
    pub date_to: Option<DateTime<Utc>>,
}

/// Available processing strategies for batch files
#[derive(Clone, Debug, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// This method constructs a BatchConfig using the CLI arguments if provided,
    /// or falls back to default values. Zero values are replaced with defaults
    /// and logged.
    ///
    /// # Returns
    ///
    /// A `BatchConfig` with values from CLI arguments or defaults.
    pub fn to_batch_config(&self) -> BatchConfig {
        // Use provided values or defaults
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            // At least one custom value provided, create custom config
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            // No custom values, use all defaults
            BatchConfig::default()
        }
    }

    /// Create an EngineConfig from CLI arguments
    ///
    /// Arguments that are not given keep the engine defaults: a 500ms lock
    /// wait and no balance floor.
    pub fn to_engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(millis) = self.lock_wait_ms {
            config.lock_wait = Duration::from_millis(millis);
        }
        if let Some(floor) = self.overdraft_floor {
            config.overdraft_policy = OverdraftPolicy::FloorLimit(floor);
        }
        config
    }

    /// Pick the report to write from CLI arguments
    ///
    /// With `--statement` the report is that account's ledger entries,
    /// optionally bounded by `--date-from` and `--date-to`. Without it the
    /// report is the balances of every account.
    pub fn to_report(&self) -> Report {
        match &self.statement {
            Some(rib) => Report::Statement {
                rib: rib.clone(),
                from: self.date_from,
                to: self.date_to,
            },
            None => Report::Balances,
        }
    }
}
