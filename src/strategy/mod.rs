//! Processing strategy module for batch instruction processing
//!
//! This module defines the Strategy pattern for complete batch processing pipelines,
//! encompassing CSV parsing, transfer engine processing, and report output. This allows
//! different processing implementations (synchronous, asynchronous batch) to be selected
//! at runtime.

use crate::cli::StrategyType;
use crate::core::{AccountStore, EngineConfig, Ledger, QueryService};
use crate::io::csv_format::{write_balances_csv, write_statement_csv};
use crate::types::LedgerError;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Report written to the output after a batch has been processed
///
/// Every strategy runs the batch to completion first, then writes exactly
/// one report.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Final balance of every account on record, sorted by RIB
    Balances,
    /// Ledger entries for one account, oldest first, with optional
    /// inclusive date bounds
    Statement {
        rib: String,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
}

/// Processing strategy trait for complete batch processing pipelines
///
/// This trait defines the interface for different batch processing implementations.
/// Each strategy must be able to read instructions from a CSV file, run them through
/// the transfer engine, and write the requested report to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Process instructions from input file and write the report to output
    ///
    /// This method reads batch instructions from the specified CSV file, runs
    /// them through the transfer engine, and writes the configured report to
    /// the provided output writer.
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the input CSV file containing batch instructions
    /// * `output` - Mutable reference to a writer for the report
    ///
    /// # Returns
    ///
    /// * `Ok(())` if all processing completed successfully (or with recoverable errors)
    /// * `Err(LedgerError)` if a fatal error occurred (file not found, I/O error, etc.)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened (file not found, permission denied)
    /// - A fatal I/O error occurs during reading or writing
    /// - Output cannot be written
    ///
    /// Individual instruction failures are logged but do not cause this method
    /// to return an error. Processing continues with the next instruction.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// This factory function implements the Strategy pattern by selecting and
/// instantiating the appropriate processing strategy implementation at runtime
/// based on the provided strategy type and configuration.
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `engine_config` - Transfer engine configuration (lock wait, overdraft policy)
/// * `report` - Report to write once the batch has been processed
/// * `config` - Optional configuration for async batch processing (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    engine_config: EngineConfig,
    report: Report,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(engine_config, report)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(engine_config, report, config))
        }
    }
}

/// Write the configured report from the final engine state
///
/// Balance reports snapshot the account store; statement reports project
/// the ledger through the query service. A RIB that matches no entries
/// produces a header-only statement, not an error.
pub(crate) fn write_report(
    report: &Report,
    accounts: &Arc<AccountStore>,
    ledger: &Arc<Ledger>,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    match report {
        Report::Balances => write_balances_csv(&accounts.accounts_snapshot(), output),
        Report::Statement { rib, from, to } => {
            let query = QueryService::new(Arc::clone(ledger));
            write_statement_csv(&query.statement(rib, *from, *to), output)
        }
    }
}
