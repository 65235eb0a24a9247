//! Account types for the Rust Ledger Engine
//!
//! This module defines the Account structure and its lifecycle status,
//! keyed by the bank account identifier (RIB).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bank account identifier (RIB)
///
/// Unique and immutable for the lifetime of the account.
pub type Rib = String;

/// Lifecycle status of an account
///
/// Only ACTIVE accounts can participate in transfers. BLOCKED and CLOSED
/// accounts are retained with their balances and ledger history intact;
/// a CLOSED account is a soft delete and is never physically removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    /// Account can send and receive transfers
    Active,

    /// Account is temporarily barred from transfers
    Blocked,

    /// Account is soft-deleted; balance and history remain readable
    Closed,
}

impl AccountStatus {
    /// String form used in reports and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Blocked => "BLOCKED",
            AccountStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bank account state
///
/// A plain value record: the owning customer is referenced by an opaque
/// identity string rather than an in-memory object graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The account identifier (RIB), unique and immutable
    pub rib: Rib,

    /// Reference to the owning customer's identity
    pub customer: String,

    /// Current balance
    ///
    /// Signed: a negative balance is a valid state. No non-negative floor
    /// is enforced unless an overdraft policy is configured on the engine.
    /// Mutated only by the transfer engine (and the opening balance).
    pub balance: Decimal,

    /// Lifecycle status
    pub status: AccountStatus,

    /// When the account was opened
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new ACTIVE account with the given opening balance
    ///
    /// # Arguments
    ///
    /// * `rib` - The account identifier
    /// * `customer` - The owning customer's identity reference
    /// * `initial_balance` - Opening balance; may be negative
    ///
    /// # Returns
    ///
    /// A new Account with ACTIVE status, timestamped at creation.
    pub fn new(rib: impl Into<Rib>, customer: impl Into<String>, initial_balance: Decimal) -> Self {
        Account {
            rib: rib.into(),
            customer: customer.into(),
            balance: initial_balance,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// Whether the account can currently participate in transfers
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}
