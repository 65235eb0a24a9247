//! Append-only transaction log
//!
//! This module provides the `Ledger` struct, the system of record for every
//! committed transfer. Entries are written in debit/credit pairs and never
//! updated or deleted afterwards.
//!
//! # Design
//!
//! The log hands out entry ids through an atomic counter and accepts writes
//! only through `append_pair`, which checks the pairing invariants (matched
//! directions, equal strictly positive amounts, shared correlation id)
//! before touching the log. A rejected pair leaves the log unchanged, which
//! is what lets the transfer engine treat the append as its commit point.
//!
//! # Thread Safety
//!
//! The entry vector sits behind a `parking_lot::RwLock`: appends take the
//! write lock briefly, queries share the read lock. Disjoint transfers
//! therefore append concurrently without coordinating with readers.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::types::{Direction, EntryId, LedgerEntry, LedgerError};

/// Append-only log of ledger entries
///
/// The ledger stores every entry ever written, in append order. Queries
/// re-sort by creation time so callers see a stable chronological view even
/// when concurrent transfers append out of timestamp order.
#[derive(Debug)]
pub struct Ledger {
    /// Committed entries in append order
    entries: RwLock<Vec<LedgerEntry>>,

    /// Next entry id to hand out; ids start at 1
    next_id: AtomicU64,
}

impl Ledger {
    /// Create an empty Ledger
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Reserve the next entry id
    ///
    /// Ids are unique and monotonically increasing per ledger. Under
    /// concurrent transfers the id order may differ from append order;
    /// queries order by creation time with the id as tie-break.
    pub fn next_entry_id(&self) -> EntryId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Append a debit/credit pair as a single unit
    ///
    /// Both legs land in the log together or not at all. The pairing
    /// invariants are checked first; a pair that violates them is rejected
    /// without writing anything.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Both entries are now on record
    /// * `Err(LedgerError::StorageFailure)` - The pair was malformed and the
    ///   log is unchanged
    pub fn append_pair(&self, debit: LedgerEntry, credit: LedgerEntry) -> Result<(), LedgerError> {
        if debit.direction != Direction::Debit || credit.direction != Direction::Credit {
            return Err(LedgerError::storage_failure(
                "entry pair has mismatched directions",
            ));
        }
        if debit.amount != credit.amount {
            return Err(LedgerError::storage_failure("entry pair amounts differ"));
        }
        if debit.amount <= Decimal::ZERO {
            return Err(LedgerError::storage_failure(
                "entry amount must be strictly positive",
            ));
        }
        if debit.correlation_id != credit.correlation_id {
            return Err(LedgerError::storage_failure(
                "entry pair correlation ids differ",
            ));
        }

        let mut entries = self.entries.write();
        entries.push(debit);
        entries.push(credit);
        Ok(())
    }

    /// Entries for one account inside an inclusive date window
    ///
    /// Omitted bounds are open-ended. The result is sorted ascending by
    /// creation time, then by entry id for entries sharing a timestamp. An
    /// inverted window matches nothing.
    pub fn query(
        &self,
        rib: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<LedgerEntry> {
        let entries = self.entries.read();
        let mut matches: Vec<LedgerEntry> = entries
            .iter()
            .filter(|entry| entry.rib == rib)
            .filter(|entry| from.map_or(true, |bound| entry.created_at >= bound))
            .filter(|entry| to.map_or(true, |bound| entry.created_at <= bound))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches
    }

    /// Both legs written under one correlation id
    pub fn entries_for_correlation(&self, correlation_id: &str) -> Vec<LedgerEntry> {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.correlation_id == correlation_id)
            .cloned()
            .collect()
    }

    /// Number of entries on record
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the log holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn entry(
        id: EntryId,
        rib: &str,
        direction: Direction,
        amount: Decimal,
        cid: &str,
        created_at: DateTime<Utc>,
    ) -> LedgerEntry {
        LedgerEntry {
            id,
            created_at,
            direction,
            amount,
            rib: rib.to_string(),
            acting_user: "user1".to_string(),
            correlation_id: cid.to_string(),
        }
    }

    fn pair(
        ids: (EntryId, EntryId),
        from: &str,
        to: &str,
        amount: Decimal,
        cid: &str,
        created_at: DateTime<Utc>,
    ) -> (LedgerEntry, LedgerEntry) {
        (
            entry(ids.0, from, Direction::Debit, amount, cid, created_at),
            entry(ids.1, to, Direction::Credit, amount, cid, created_at),
        )
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn test_next_entry_id_monotonic() {
        let ledger = Ledger::new();
        assert_eq!(ledger.next_entry_id(), 1);
        assert_eq!(ledger.next_entry_id(), 2);
        assert_eq!(ledger.next_entry_id(), 3);
    }

    #[test]
    fn test_append_pair_stores_both_legs() {
        let ledger = Ledger::new();
        let (debit, credit) = pair(
            (1, 2),
            "RIB_1",
            "RIB_2",
            Decimal::new(10_000, 0),
            "corr-1",
            ts(1, 9),
        );

        ledger.append_pair(debit, credit).unwrap();

        assert_eq!(ledger.len(), 2);
        let legs = ledger.entries_for_correlation("corr-1");
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].direction, Direction::Debit);
        assert_eq!(legs[0].rib, "RIB_1");
        assert_eq!(legs[1].direction, Direction::Credit);
        assert_eq!(legs[1].rib, "RIB_2");
    }

    #[test]
    fn test_append_pair_rejects_mismatched_directions() {
        let ledger = Ledger::new();
        let first = entry(1, "RIB_1", Direction::Debit, Decimal::ONE, "corr-1", ts(1, 9));
        let second = entry(2, "RIB_2", Direction::Debit, Decimal::ONE, "corr-1", ts(1, 9));

        let result = ledger.append_pair(first, second);

        assert!(matches!(result, Err(LedgerError::StorageFailure { .. })));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_append_pair_rejects_amount_mismatch() {
        let ledger = Ledger::new();
        let debit = entry(1, "RIB_1", Direction::Debit, Decimal::new(100, 0), "corr-1", ts(1, 9));
        let credit = entry(2, "RIB_2", Direction::Credit, Decimal::new(99, 0), "corr-1", ts(1, 9));

        let result = ledger.append_pair(debit, credit);

        assert!(matches!(result, Err(LedgerError::StorageFailure { .. })));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_append_pair_rejects_nonpositive_amount() {
        let ledger = Ledger::new();
        let (debit, credit) = pair((1, 2), "RIB_1", "RIB_2", Decimal::ZERO, "corr-1", ts(1, 9));

        let result = ledger.append_pair(debit, credit);

        assert!(matches!(result, Err(LedgerError::StorageFailure { .. })));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_append_pair_rejects_correlation_mismatch() {
        let ledger = Ledger::new();
        let debit = entry(1, "RIB_1", Direction::Debit, Decimal::ONE, "corr-1", ts(1, 9));
        let credit = entry(2, "RIB_2", Direction::Credit, Decimal::ONE, "corr-2", ts(1, 9));

        let result = ledger.append_pair(debit, credit);

        assert!(matches!(result, Err(LedgerError::StorageFailure { .. })));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_query_filters_by_rib() {
        let ledger = Ledger::new();
        let (d1, c1) = pair((1, 2), "RIB_1", "RIB_2", Decimal::ONE, "corr-1", ts(1, 9));
        let (d2, c2) = pair((3, 4), "RIB_3", "RIB_1", Decimal::ONE, "corr-2", ts(2, 9));
        ledger.append_pair(d1, c1).unwrap();
        ledger.append_pair(d2, c2).unwrap();

        let entries = ledger.query("RIB_1", None, None);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].direction, Direction::Debit);
        assert_eq!(entries[1].direction, Direction::Credit);
        assert!(entries.iter().all(|e| e.rib == "RIB_1"));
    }

    #[test]
    fn test_query_bounds_inclusive() {
        let ledger = Ledger::new();
        for (day, cid) in [(1, "corr-1"), (2, "corr-2"), (3, "corr-3")] {
            let ids = (ledger.next_entry_id(), ledger.next_entry_id());
            let (d, c) = pair(ids, "RIB_1", "RIB_2", Decimal::ONE, cid, ts(day, 9));
            ledger.append_pair(d, c).unwrap();
        }

        // Bounds land exactly on entry timestamps and still match
        let all = ledger.query("RIB_1", Some(ts(1, 9)), Some(ts(3, 9)));
        assert_eq!(all.len(), 3);

        let middle = ledger.query("RIB_1", Some(ts(2, 9)), Some(ts(2, 9)));
        assert_eq!(middle.len(), 1);
        assert_eq!(middle[0].created_at, ts(2, 9));
    }

    #[test]
    fn test_query_open_ended_bounds() {
        let ledger = Ledger::new();
        for (day, cid) in [(1, "corr-1"), (2, "corr-2"), (3, "corr-3")] {
            let ids = (ledger.next_entry_id(), ledger.next_entry_id());
            let (d, c) = pair(ids, "RIB_1", "RIB_2", Decimal::ONE, cid, ts(day, 9));
            ledger.append_pair(d, c).unwrap();
        }

        assert_eq!(ledger.query("RIB_1", None, None).len(), 3);
        assert_eq!(ledger.query("RIB_1", Some(ts(2, 0)), None).len(), 2);
        assert_eq!(ledger.query("RIB_1", None, Some(ts(2, 23))).len(), 2);
    }

    #[test]
    fn test_query_inverted_window_is_empty() {
        let ledger = Ledger::new();
        let (d, c) = pair((1, 2), "RIB_1", "RIB_2", Decimal::ONE, "corr-1", ts(2, 9));
        ledger.append_pair(d, c).unwrap();

        let entries = ledger.query("RIB_1", Some(ts(3, 0)), Some(ts(1, 0)));

        assert!(entries.is_empty());
    }

    #[test]
    fn test_query_sorted_by_creation_time() {
        let ledger = Ledger::new();
        // Appended out of chronological order
        let (d1, c1) = pair((1, 2), "RIB_1", "RIB_2", Decimal::ONE, "corr-1", ts(3, 9));
        let (d2, c2) = pair((3, 4), "RIB_1", "RIB_2", Decimal::ONE, "corr-2", ts(1, 9));
        let (d3, c3) = pair((5, 6), "RIB_1", "RIB_2", Decimal::ONE, "corr-3", ts(2, 9));
        ledger.append_pair(d1, c1).unwrap();
        ledger.append_pair(d2, c2).unwrap();
        ledger.append_pair(d3, c3).unwrap();

        let entries = ledger.query("RIB_1", None, None);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].created_at, ts(1, 9));
        assert_eq!(entries[1].created_at, ts(2, 9));
        assert_eq!(entries[2].created_at, ts(3, 9));
    }

    #[test]
    fn test_query_breaks_timestamp_ties_by_id() {
        let ledger = Ledger::new();
        let stamp = ts(1, 9);
        let (d1, c1) = pair((7, 8), "RIB_1", "RIB_2", Decimal::ONE, "corr-1", stamp);
        let (d2, c2) = pair((3, 4), "RIB_1", "RIB_2", Decimal::ONE, "corr-2", stamp);
        ledger.append_pair(d1, c1).unwrap();
        ledger.append_pair(d2, c2).unwrap();

        let entries = ledger.query("RIB_1", None, None);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, 3);
        assert_eq!(entries[1].id, 7);
    }

    #[test]
    fn test_concurrent_appends_keep_all_pairs() {
        let ledger = Arc::new(Ledger::new());
        let mut handles = vec![];

        for i in 0..10 {
            let ledger = Arc::clone(&ledger);
            let handle = thread::spawn(move || {
                let ids = (ledger.next_entry_id(), ledger.next_entry_id());
                let (d, c) = pair(
                    ids,
                    &format!("RIB_{}", i),
                    "RIB_SINK",
                    Decimal::ONE,
                    &format!("corr-{}", i),
                    Utc::now(),
                );
                ledger.append_pair(d, c).unwrap();
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.len(), 20);

        // Every reserved id landed exactly once
        let ids: HashSet<EntryId> = ledger
            .query("RIB_SINK", None, None)
            .iter()
            .map(|e| e.id)
            .chain(
                (0..10).flat_map(|i| {
                    ledger
                        .query(&format!("RIB_{}", i), None, None)
                        .iter()
                        .map(|e| e.id)
                        .collect::<Vec<_>>()
                }),
            )
            .collect();
        assert_eq!(ids.len(), 20);
    }
}
