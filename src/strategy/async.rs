//! Asynchronous batch processing strategy
//!
//! This module provides an asynchronous, multi-threaded implementation of the
//! ProcessingStrategy trait. It processes instructions in batches using task-based
//! parallelism with source-account partitioning.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (source partitioning + lifecycle barriers)
//!     └── TransferEngine (thread-safe processing)
//!         ├── AccountStore (per-account row locks)
//!         └── Ledger (append-only transaction log)
//! ```
//!
//! # Task-Based Parallelism
//!
//! This strategy uses true multi-threaded parallelism:
//! - Processes batches sequentially to maintain per-source ordering across the entire file
//! - Within each batch, partitions transfer runs by source RIB for parallel processing
//! - Spawns worker tasks via tokio multi-threaded runtime
//! - Maintains per-source transfer ordering both within and across batches
//! - Uses Arc + per-account locks for thread-safe shared state

use crate::core::{AccountStore, BatchProcessor, EngineConfig, Ledger, TransferEngine};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{write_report, ProcessingStrategy, Report};
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Configuration for batch processing
///
/// Controls how instructions are batched and the number of worker threads
/// for parallel processing within each batch.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of instructions per batch
    pub batch_size: usize,
    /// Maximum number of transfer runs processing concurrently
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size,
                default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            tracing::warn!(
                "Invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches,
                default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// Implements the ProcessingStrategy trait using multi-threaded, asynchronous
/// batch processing. Instructions are read in batches and processed sequentially
/// (batch-by-batch) to maintain ordering guarantees. Within each batch, transfer
/// runs are partitioned by source RIB and processed in parallel across tasks,
/// while lifecycle instructions act as barriers.
///
/// # Thread Safety
///
/// AsyncProcessingStrategy is Send + Sync and uses thread-safe components
/// internally (Arc-wrapped TransferEngine with per-account locks).
///
/// # Configuration
///
/// The strategy accepts a BatchConfig with:
/// - `batch_size`: Number of instructions per batch (default: 1000)
/// - `max_concurrent_batches`: Number of worker threads (default: CPU cores)
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    /// Transfer engine configuration
    engine_config: EngineConfig,
    /// Report to write once the batch has been processed
    report: Report,
    /// Batch processing configuration
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy with the specified configuration
    ///
    /// # Arguments
    ///
    /// * `engine_config` - Transfer engine configuration
    /// * `report` - Report to write once the batch has been processed
    /// * `config` - BatchConfig with batch_size and max_concurrent_batches
    ///
    /// # Returns
    ///
    /// A new `AsyncProcessingStrategy` configured for batch processing
    pub fn new(engine_config: EngineConfig, report: Report, config: BatchConfig) -> Self {
        Self {
            engine_config,
            report,
            config,
        }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Process instructions from input file and write the report to output
    ///
    /// This method implements the complete asynchronous batch processing pipeline:
    /// 1. Creates the thread-safe engine components (AccountStore, Ledger, TransferEngine)
    /// 2. Creates a BatchProcessor for source-based partitioning
    /// 3. Creates a tokio multi-threaded runtime
    /// 4. Reads instructions in batches from CSV using AsyncReader
    /// 5. Processes each batch sequentially (waits for completion before next batch)
    /// 6. Within each batch, processes different source accounts in parallel
    /// 7. Writes the configured report to output
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
    /// Fatal errors (file not found, I/O errors, runtime errors) are returned immediately.
    /// Individual instruction failures are logged and processing continues.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError> {
        // Create tokio runtime for async execution
        // Use multi-threaded runtime with configured number of worker threads
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| LedgerError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        // Execute async processing within the runtime
        runtime.block_on(async {
            // Create thread-safe engine components
            let accounts = Arc::new(AccountStore::new());
            let ledger = Arc::new(Ledger::new());
            let engine = Arc::new(TransferEngine::with_config(
                Arc::clone(&accounts),
                Arc::clone(&ledger),
                self.engine_config.clone(),
            ));

            // Create batch processor
            let processor = BatchProcessor::new(Arc::clone(&engine));

            // Open the CSV file
            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => LedgerError::FileNotFound {
                        path: input_path.display().to_string(),
                    },
                    _ => LedgerError::from(e),
                })?;

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);

            // Create async CSV reader
            let mut reader = AsyncReader::new(compat_file);

            // Process batches sequentially to maintain per-source ordering across the file
            // Each batch is still processed in parallel across different source accounts
            loop {
                // Read a batch of instructions using AsyncReader
                let batch = reader.read_batch(self.config.batch_size).await;

                // If batch is empty, we've reached end of file
                if batch.is_empty() {
                    break;
                }

                // Process batch and wait for completion before reading next batch
                // This ensures that if a source's transfers span multiple batches,
                // they are processed in the correct order
                let _results = processor.process_batch(batch).await;
            }

            // Write the report from the final engine state
            write_report(&self.report, &accounts, &ledger, output)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn balances_strategy(config: BatchConfig) -> AsyncProcessingStrategy {
        AsyncProcessingStrategy::new(EngineConfig::default(), Report::Balances, config)
    }

    #[test]
    fn test_async_strategy_processes_valid_transfer() {
        let csv_content = "type,rib,rib_to,amount,user,cid\n\
                          open,RIB_1,,1000000,user1,\n\
                          open,RIB_2,,2000000,user2,\n\
                          transfer,RIB_1,RIB_2,10000,user1,\n";
        let file = create_temp_csv(csv_content);

        let strategy = balances_strategy(BatchConfig::default());
        let mut output = Vec::new();

        let result = strategy.process(file.path(), &mut output);
        assert!(result.is_ok());

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("RIB_1,user1,990000,ACTIVE"));
        assert!(output_str.contains("RIB_2,user2,2010000,ACTIVE"));
    }

    #[test]
    fn test_async_strategy_processes_multiple_accounts() {
        let csv_content = "type,rib,rib_to,amount,user,cid\n\
                          open,RIB_1,,1000,user1,\n\
                          open,RIB_2,,2000,user2,\n\
                          open,RIB_3,,0,user3,\n\
                          transfer,RIB_1,RIB_3,100,user1,\n\
                          transfer,RIB_2,RIB_3,200,user2,\n";
        let file = create_temp_csv(csv_content);

        let strategy = balances_strategy(BatchConfig::default());
        let mut output = Vec::new();

        let result = strategy.process(file.path(), &mut output);
        assert!(result.is_ok());

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("RIB_1,user1,900,ACTIVE"));
        assert!(output_str.contains("RIB_2,user2,1800,ACTIVE"));
        assert!(output_str.contains("RIB_3,user3,300,ACTIVE"));
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let strategy = balances_strategy(BatchConfig::default());
        let mut output = Vec::new();

        let result = strategy.process(Path::new("nonexistent.csv"), &mut output);
        assert!(matches!(result, Err(LedgerError::FileNotFound { .. })));
    }

    #[test]
    fn test_async_strategy_maintains_ordering_across_batches() {
        // This test verifies that sequential batch processing maintains
        // per-source ordering even when a source's transfers span multiple batches
        let csv_content = "type,rib,rib_to,amount,user,cid\n\
                          open,RIB_1,,1000,user1,\n\
                          open,RIB_2,,500,user2,\n\
                          transfer,RIB_1,RIB_2,100,user1,\n\
                          transfer,RIB_2,RIB_1,50,user2,\n\
                          transfer,RIB_1,RIB_2,200,user1,\n";
        let file = create_temp_csv(csv_content);

        // Use a small batch size to force multiple batches
        let config = BatchConfig::new(2, num_cpus::get());
        let strategy = balances_strategy(config);
        let mut output = Vec::new();

        let result = strategy.process(file.path(), &mut output);
        assert!(result.is_ok());

        // Parse output to verify final balances
        let output_str = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output_str.lines().collect();

        // RIB_1: 1000 - 100 + 50 - 200 = 750
        let rib1_line = lines.iter().find(|line| line.starts_with("RIB_1,")).unwrap();
        assert!(
            rib1_line.contains(",750,"),
            "RIB_1 should have 750, got: {}",
            rib1_line
        );

        // RIB_2: 500 + 100 - 50 + 200 = 750
        let rib2_line = lines.iter().find(|line| line.starts_with("RIB_2,")).unwrap();
        assert!(
            rib2_line.contains(",750,"),
            "RIB_2 should have 750, got: {}",
            rib2_line
        );
    }

    #[test]
    fn test_async_strategy_writes_statement_report() {
        let csv_content = "type,rib,rib_to,amount,user,cid\n\
                          open,RIB_1,,1000,user1,\n\
                          open,RIB_2,,0,user2,\n\
                          transfer,RIB_1,RIB_2,250,user1,corr-9\n";
        let file = create_temp_csv(csv_content);

        let strategy = AsyncProcessingStrategy::new(
            EngineConfig::default(),
            Report::Statement {
                rib: "RIB_2".to_string(),
                from: None,
                to: None,
            },
            BatchConfig::default(),
        );
        let mut output = Vec::new();

        let result = strategy.process(file.path(), &mut output);
        assert!(result.is_ok());

        let output_str = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output_str.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("CREDIT,250,RIB_2,user1,corr-9"));
    }

    #[test]
    fn test_batch_config_zero_values_fall_back_to_defaults() {
        let config = BatchConfig::new(0, 0);

        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.max_concurrent_batches, num_cpus::get());
    }

    #[test]
    fn test_batch_config_custom_values() {
        let config = BatchConfig::new(250, 4);

        assert_eq!(config.batch_size, 250);
        assert_eq!(config.max_concurrent_batches, 4);
    }
}
