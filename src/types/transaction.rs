//! Transaction log and transfer types
//!
//! Defines the append-only ledger entry record, the transient transfer
//! request submitted by back-office operators, and the parsed instruction
//! set accepted from batch input files.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::account::Rib;

/// Unique identifier for a ledger entry, assigned by the transaction log
pub type EntryId = u64;

/// Side of a double-entry movement
///
/// Every committed transfer produces exactly one `Debit` entry on the
/// source account and one `Credit` entry on the destination account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    /// String form used in reports and log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Debit => "DEBIT",
            Direction::Credit => "CREDIT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable ledger entry
///
/// Entries are created in pairs by the transfer engine and never updated
/// or deleted afterwards. The `correlation_id` links the two legs of the
/// same transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Identifier assigned by the transaction log
    pub id: EntryId,

    /// Creation timestamp; both legs of a pair share the same instant
    pub created_at: DateTime<Utc>,

    /// Debit on the source account, credit on the destination account
    pub direction: Direction,

    /// Movement amount, always strictly positive
    pub amount: Decimal,

    /// Account the entry belongs to
    pub rib: Rib,

    /// Username of the operator who submitted the transfer
    pub acting_user: String,

    /// Shared identifier linking the debit and credit legs of one transfer
    pub correlation_id: String,
}

impl LedgerEntry {
    /// Amount with its accounting sign: negative for debits, positive for credits
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::Debit => -self.amount,
            Direction::Credit => self.amount,
        }
    }
}

/// Transfer order submitted by a back-office operator
///
/// The request is transient: it is consumed by the transfer engine and
/// never persisted itself. Only the resulting ledger entries are durable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Source account RIB
    pub rib_from: Rib,

    /// Destination account RIB
    pub rib_to: Rib,

    /// Amount to move, expected strictly positive
    pub amount: Decimal,

    /// Username of the operator submitting the order
    pub username: String,

    /// Optional client-supplied idempotency key; reused as the
    /// correlation id of the resulting entry pair when present
    pub cid: Option<String>,
}

impl TransferRequest {
    /// Create a transfer request without an idempotency key
    pub fn new(
        rib_from: impl Into<Rib>,
        rib_to: impl Into<Rib>,
        amount: Decimal,
        username: impl Into<String>,
    ) -> Self {
        Self {
            rib_from: rib_from.into(),
            rib_to: rib_to.into(),
            amount,
            username: username.into(),
            cid: None,
        }
    }

    /// Create a transfer request carrying an idempotency key
    pub fn with_cid(
        rib_from: impl Into<Rib>,
        rib_to: impl Into<Rib>,
        amount: Decimal,
        username: impl Into<String>,
        cid: impl Into<String>,
    ) -> Self {
        Self {
            rib_from: rib_from.into(),
            rib_to: rib_to.into(),
            amount,
            username: username.into(),
            cid: Some(cid.into()),
        }
    }
}

/// Outcome of a committed transfer: the two ledger entries written for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Entry debited from the source account
    pub debit: LedgerEntry,

    /// Entry credited to the destination account
    pub credit: LedgerEntry,
}

impl TransferReceipt {
    /// Correlation id shared by both legs
    pub fn correlation_id(&self) -> &str {
        &self.debit.correlation_id
    }
}

/// Parsed batch instruction
///
/// One CSV row of a batch file converts to exactly one instruction.
/// Lifecycle instructions (`Open`, `Block`, `Close`) act on a single
/// account; `Transfer` moves funds between two accounts.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Open a new account with an initial balance
    Open {
        rib: Rib,
        customer: String,
        initial_balance: Decimal,
    },

    /// Move funds between two existing accounts
    Transfer(TransferRequest),

    /// Block an account, rejecting further transfers on it
    Block { rib: Rib },

    /// Soft-close an account; the row stays on record
    Close { rib: Rib },
}
