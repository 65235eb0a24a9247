//! Batch execution with source-account partitioning
//!
//! This module provides the `BatchProcessor`, which executes a batch of
//! parsed instructions against a shared `TransferEngine`, running transfers
//! for different source accounts concurrently.
//!
//! # Design
//!
//! Consecutive transfer instructions form a run. A run is partitioned by
//! source RIB, and each partition executes sequentially on its own tokio
//! task, so transfers leaving different accounts proceed in parallel while
//! transfers leaving the same account keep their file order.
//!
//! Lifecycle instructions (open, block, close) act as barriers: the run
//! queued before one must settle first, then the lifecycle change applies,
//! then the next run begins. A transfer therefore always sees the account
//! states produced by every lifecycle instruction above it in the file.
//!
//! # Thread Safety
//!
//! The processor is cloneable and can be safely shared across async tasks.
//! The underlying engine synchronizes per account row.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::engine::TransferEngine;
use crate::types::{Instruction, LedgerError, Rib, TransferRequest};

/// Result of executing a single instruction
///
/// Contains the original instruction and the outcome of executing it.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The instruction that was executed
    pub instruction: Instruction,

    /// The outcome (success or error)
    pub result: Result<(), LedgerError>,
}

/// Batch processor with source-account partitioning
///
/// `BatchProcessor` executes batches of instructions by partitioning each
/// run of transfers by source RIB. This lets transfers leaving different
/// accounts commit concurrently while transfers leaving the same account
/// keep their original order.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    /// Shared transfer engine
    ///
    /// Wrapped in Arc to enable sharing across async tasks.
    engine: Arc<TransferEngine>,
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `engine` - Arc-wrapped TransferEngine executing the instructions
    ///
    /// # Returns
    ///
    /// A new `BatchProcessor` that can be cloned and shared across async
    /// tasks.
    pub fn new(engine: Arc<TransferEngine>) -> Self {
        Self { engine }
    }

    /// Partition a run of transfers by source RIB
    ///
    /// # Arguments
    ///
    /// * `run` - A vector of transfer requests to partition
    ///
    /// # Returns
    ///
    /// A HashMap where:
    /// - Keys are source RIBs
    /// - Values are the transfers leaving that account (in original order)
    ///
    /// # Guarantees
    ///
    /// - Each transfer appears in exactly one partition
    /// - No transfers are lost or duplicated
    /// - Transfers leaving the same account maintain their original order
    pub fn partition_by_source(
        &self,
        run: Vec<TransferRequest>,
    ) -> HashMap<Rib, Vec<TransferRequest>> {
        let mut source_runs: HashMap<Rib, Vec<TransferRequest>> = HashMap::new();

        for request in run {
            source_runs
                .entry(request.rib_from.clone())
                .or_default()
                .push(request);
        }

        source_runs
    }

    /// Execute all transfers leaving a single account, sequentially
    ///
    /// # Arguments
    ///
    /// * `requests` - The transfers leaving one account (in order)
    ///
    /// # Returns
    ///
    /// A vector of `ProcessingResult`, one per transfer, in input order.
    /// A failed transfer is captured in its result and does not stop the
    /// remaining transfers.
    pub async fn process_source_transfers(
        &self,
        requests: Vec<TransferRequest>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            let result = self.engine.transfer(request.clone()).map(|_| ());
            results.push(ProcessingResult {
                instruction: Instruction::Transfer(request),
                result,
            });
        }

        results
    }

    /// Execute a run of transfers with source-account partitioning
    ///
    /// Partitions the run by source RIB, spawns a tokio task per source,
    /// waits for every task, and collects the results.
    ///
    /// # Arguments
    ///
    /// * `run` - A vector of transfer requests to execute
    ///
    /// # Returns
    ///
    /// A vector of `ProcessingResult`, one per transfer. Results for
    /// transfers leaving the same account are in their original order;
    /// across different source accounts no ordering is guaranteed.
    pub async fn process_transfer_run(&self, run: Vec<TransferRequest>) -> Vec<ProcessingResult> {
        let source_runs = self.partition_by_source(run);

        let mut tasks = Vec::new();
        for (_rib, requests) in source_runs {
            let processor = self.clone();
            let task = tokio::spawn(async move { processor.process_source_transfers(requests).await });
            tasks.push(task);
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(source_results) => results.extend(source_results),
                Err(e) => {
                    tracing::error!("Transfer task panicked: {:?}", e);
                }
            }
        }

        results
    }

    /// Execute a batch of instructions
    ///
    /// Transfers between two lifecycle instructions execute concurrently as
    /// one run; each lifecycle instruction flushes the pending run before it
    /// applies. The output is therefore equal to executing the batch one
    /// instruction at a time.
    ///
    /// # Arguments
    ///
    /// * `batch` - A vector of instructions to execute
    ///
    /// # Returns
    ///
    /// A vector of `ProcessingResult`, one per instruction. Errors are
    /// captured in results and don't stop the batch.
    pub async fn process_batch(&self, batch: Vec<Instruction>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(batch.len());
        let mut pending: Vec<TransferRequest> = Vec::new();

        for instruction in batch {
            match instruction {
                Instruction::Transfer(request) => pending.push(request),
                lifecycle => {
                    // A lifecycle instruction is a barrier: the transfers
                    // queued before it must settle first
                    if !pending.is_empty() {
                        results.extend(
                            self.process_transfer_run(std::mem::take(&mut pending)).await,
                        );
                    }
                    let result = self.engine.apply(lifecycle.clone());
                    results.push(ProcessingResult {
                        instruction: lifecycle,
                        result,
                    });
                }
            }
        }

        if !pending.is_empty() {
            results.extend(self.process_transfer_run(pending).await);
        }

        results
    }
}
