//! Rust Ledger Engine CLI
//!
//! Command-line interface for processing back office transfer instructions from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- instructions.csv > balances.csv
//! cargo run -- --strategy sync instructions.csv > balances.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 instructions.csv > balances.csv
//! cargo run -- --statement RIB_1 --date-from 2026-03-01T00:00:00Z instructions.csv > statement.csv
//! ```
//!
//! The program reads batch instructions from the input CSV file, runs them
//! through the transfer engine using the selected processing strategy, and
//! writes the requested report to stdout. Logs go to stderr; set RUST_LOG to
//! adjust verbosity.
//!
//! # Processing Strategies
//!
//! - **sync**: Synchronous CSV parsing with single-threaded processing
//! - **async**: Asynchronous batch processing with multi-threaded parallelism (default)
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use rust_ledger_engine::cli;
use rust_ledger_engine::strategy;
use std::process;

fn main() {
    // Route logs to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command-line arguments using clap
    let args = cli::parse_args();

    // Create the appropriate processing strategy based on CLI arguments
    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        let engine_config = args.to_engine_config();
        let report = args.to_report();
        strategy::create_strategy(args.strategy, engine_config, report, config)
    };

    // Process the batch using the selected strategy
    // The report goes to stdout
    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
