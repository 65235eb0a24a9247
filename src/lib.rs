//! Rust Ledger Engine Library
//! # Overview
//!
//! This library provides a streaming CSV-based back office transfer engine implementing both sync and an async strategy
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, LedgerEntry, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Transfer validation and atomic commit
//!   - [`core::account_store`] - Account rows with per-account locking
//!   - [`core::ledger`] - Append-only transaction log
//!   - [`core::query`] - Account statement queries
//!   - [`core::batch`] - Batch orchestration for the async strategy
//! - [`io`] - I/O handling with pluggable parsing strategies
//!
//! # Instruction Set
//!
//! The engine supports four batch instructions:
//!
//! - **Open**: Put a new account on record in ACTIVE status
//! - **Transfer**: Move funds between two accounts as a correlated debit/credit entry pair
//! - **Block**: Set an account to BLOCKED so it no longer takes part in transfers
//! - **Close**: Soft close an account; the row stays on record
//!
//! # Account States
//!
//! Each account carries:
//! - `balance`: Signed decimal balance; negative balances are a valid state
//! - `status`: ACTIVE, BLOCKED, or CLOSED; only ACTIVE accounts take part in transfers
//! - `customer`: Reference to the owning customer
//! - `created_at`: Creation timestamp

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    AccountStore, BatchProcessor, EngineConfig, Ledger, OverdraftPolicy, QueryService,
    TransferEngine,
};
pub use io::{write_balances_csv, write_statement_csv};
pub use types::{
    Account, AccountStatus, Direction, Instruction, LedgerEntry, LedgerError, Rib,
    TransferReceipt, TransferRequest,
};
