//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account state and lifecycle status
//! - `transaction`: Ledger entries, transfer requests and receipts
//! - `error`: Error types for the ledger engine

pub mod account;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountStatus, Rib};
pub use error::LedgerError;
pub use transaction::{Direction, EntryId, Instruction, LedgerEntry, TransferReceipt, TransferRequest};
