//! Account statement queries
//!
//! This module provides the `QueryService`, the read-only counterpart of
//! the transfer engine. It answers per-account statement queries over the
//! transaction log, optionally restricted to a date window.
//!
//! The service is a pure projection of the log: it never consults the
//! account store, never takes row locks, and never mutates anything, so
//! queries can be rerun at any time (after a crash, from a retrying
//! client) and return the same result for the same window.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::ledger::Ledger;
use crate::types::LedgerEntry;

/// Read-only statement queries over the transaction log
#[derive(Debug, Clone)]
pub struct QueryService {
    ledger: Arc<Ledger>,
}

impl QueryService {
    /// Create a new QueryService over the given log
    pub fn new(ledger: Arc<Ledger>) -> Self {
        QueryService { ledger }
    }

    /// Fetch the statement of one account
    ///
    /// Returns every ledger entry touching `rib` whose creation time falls
    /// inside the window, oldest first. Both bounds are inclusive and both
    /// are optional; an absent bound leaves that side of the window open.
    ///
    /// A RIB that matches no entries yields an empty statement, whether the
    /// account has no history, is closed, or was never opened at all. The
    /// statement view does not distinguish these cases; account existence
    /// is the store's concern, not the log's.
    ///
    /// # Arguments
    ///
    /// * `rib` - The account to fetch the statement for
    /// * `from` - Inclusive lower bound on entry creation time
    /// * `to` - Inclusive upper bound on entry creation time
    pub fn statement(
        &self,
        rib: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<LedgerEntry> {
        self.ledger.query(rib, from, to)
    }
}
