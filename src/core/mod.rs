//! Core business logic module
//!
//! This module contains the core ledger components:
//! - `account_store` - Account rows and lifecycle operations
//! - `ledger` - Append-only transaction log
//! - `engine` - Transfer validation and atomic commit
//! - `query` - Read-only statement queries
//! - `batch` - Concurrent batch execution of parsed instructions

pub mod account_store;
pub mod batch;
pub mod engine;
pub mod ledger;
pub mod query;

pub use account_store::{AccountCell, AccountStore};
pub use batch::{BatchProcessor, ProcessingResult};
pub use engine::{EngineConfig, OverdraftPolicy, TransferEngine, DEFAULT_LOCK_WAIT_MS};
pub use ledger::Ledger;
pub use query::QueryService;
