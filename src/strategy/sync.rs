//! Synchronous processing strategy
//!
//! This module provides a synchronous, single-threaded implementation of the
//! ProcessingStrategy trait. It orchestrates batch processing by coordinating
//! between the SyncReader (for CSV input) and TransferEngine (for business logic).
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Instruction processing to `TransferEngine` (business logic)
//! - Report output to `csv_format` via `write_report` (format handling)
//!
//! This separation of concerns makes the code more maintainable and testable.
//!
//! # Memory Efficiency
//!
//! This strategy maintains constant memory usage for the account side:
//! - Processes CSV rows one at a time (streaming via iterator)
//! - Does not load the entire file into memory
//! - The transaction log grows with committed transfers, which the ledger
//!   keeps on record by design
//!
//! # Thread Safety
//!
//! While this strategy is single-threaded, it implements Send + Sync to be
//! compatible with the ProcessingStrategy trait, allowing it to be used in
//! multi-threaded contexts if needed.

use crate::core::{AccountStore, EngineConfig, Ledger, TransferEngine};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{write_report, ProcessingStrategy, Report};
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Synchronous processing strategy
///
/// Implements the ProcessingStrategy trait using single-threaded, synchronous
/// processing. Orchestrates the flow between CSV reading, instruction processing,
/// and report generation.
///
/// # Examples
///
/// ```no_run
/// use rust_ledger_engine::core::EngineConfig;
/// use rust_ledger_engine::strategy::{ProcessingStrategy, Report, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(EngineConfig::default(), Report::Balances);
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("instructions.csv"), &mut output)
///     .expect("Processing failed");
/// ```
///
/// # Thread Safety
///
/// SyncProcessingStrategy is Send + Sync, allowing it to be shared across threads
/// safely, even though it performs single-threaded processing.
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    /// Transfer engine configuration
    engine_config: EngineConfig,
    /// Report to write once the batch has been processed
    report: Report,
}

impl SyncProcessingStrategy {
    /// Create a new SyncProcessingStrategy
    ///
    /// # Arguments
    ///
    /// * `engine_config` - Transfer engine configuration
    /// * `report` - Report to write once the batch has been processed
    pub fn new(engine_config: EngineConfig, report: Report) -> Self {
        Self {
            engine_config,
            report,
        }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Process instructions from input file and write the report to output
    ///
    /// This method orchestrates the complete synchronous processing pipeline:
    /// 1. Creates the account store, ledger, and transfer engine
    /// 2. Creates a SyncReader to stream instructions from the CSV file
    /// 3. Iterates through rows, applying each through the engine
    /// 4. Writes the configured report to output
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the input CSV file
    /// * `output` - Mutable reference to a writer for the report
    ///
    /// # Returns
    ///
    /// * `Ok(())` if processing completed successfully
    /// * `Err(LedgerError)` if a fatal error occurred
    ///
    /// # Error Handling
    ///
    /// Fatal errors (file not found, I/O errors) are returned immediately.
    /// Individual instruction failures are logged and processing continues.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError> {
        // Create the engine around a fresh store and ledger
        let accounts = Arc::new(AccountStore::new());
        let ledger = Arc::new(Ledger::new());
        let engine = TransferEngine::with_config(
            Arc::clone(&accounts),
            Arc::clone(&ledger),
            self.engine_config.clone(),
        );

        // Create sync reader for streaming CSV input
        let reader = SyncReader::new(input_path)?;

        // Apply each instruction through the engine
        // The iterator interface allows us to process one row at a time
        for result in reader {
            match result {
                Ok(instruction) => {
                    // The engine logs every rejected instruction itself
                    let _ = engine.apply(instruction);
                }
                Err(e) => {
                    // Log CSV parsing/conversion errors and keep going
                    tracing::warn!("Skipping row: {}", e);
                }
            }
        }

        // Write the report from the final engine state
        write_report(&self.report, &accounts, &ledger, output)
    }
}
