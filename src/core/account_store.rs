//! Thread-safe account store with per-row locking
//!
//! This module provides the `AccountStore` struct, which holds every account
//! row keyed by RIB and synchronizes access per account rather than globally.
//!
//! # Design
//!
//! Each row lives in an `Arc<Mutex<Account>>` cell inside a `DashMap`. Callers
//! clone the cell out of the map before locking it, so no map shard lock is
//! ever held while a row lock is held. This lets the transfer engine lock two
//! rows for the duration of a commit while unrelated store operations proceed.
//!
//! Accounts are never removed: closing an account flips its status to
//! `CLOSED` and leaves the row on record.
//!
//! # Thread Safety
//!
//! All operations take `&self` and are safe to call from multiple threads.
//! Operations on different accounts proceed in parallel; operations on the
//! same account serialize on its row lock.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::types::{Account, AccountStatus, LedgerError, Rib};

/// Shared handle to one account row
///
/// The transfer engine locks two of these in RIB order during a commit.
pub type AccountCell = Arc<Mutex<Account>>;

/// Account store keyed by RIB
///
/// `AccountStore` owns every account row and hands out `AccountCell` handles
/// for row-level locking. It enforces RIB uniqueness on open and keeps
/// soft-closed accounts on record.
#[derive(Debug, Default)]
pub struct AccountStore {
    /// Account rows keyed by RIB
    ///
    /// DashMap gives lock-free reads across shards; the per-row Mutex
    /// serializes balance and status writes for one account.
    accounts: DashMap<Rib, AccountCell>,
}

impl AccountStore {
    /// Create an empty AccountStore
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Open a new account in ACTIVE status
    ///
    /// The initial balance may be negative; the store places no floor on
    /// balances.
    ///
    /// # Arguments
    ///
    /// * `rib` - Unique account identifier
    /// * `customer` - Owning customer reference
    /// * `initial_balance` - Opening balance
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - Snapshot of the newly opened account
    /// * `Err(LedgerError::DuplicateAccount)` - If the RIB is already taken
    ///
    /// # Thread Safety
    ///
    /// Uses the map entry API, so concurrent opens of the same RIB produce
    /// exactly one account.
    pub fn open_account(
        &self,
        rib: impl Into<Rib>,
        customer: impl Into<String>,
        initial_balance: Decimal,
    ) -> Result<Account, LedgerError> {
        let rib = rib.into();
        let mut opened = None;
        self.accounts.entry(rib.clone()).or_insert_with(|| {
            let account = Account::new(rib.clone(), customer, initial_balance);
            opened = Some(account.clone());
            Arc::new(Mutex::new(account))
        });
        opened.ok_or_else(|| LedgerError::duplicate_account(&rib))
    }

    /// Row handle for an account, if it exists
    ///
    /// The cell is cloned out of the map, so the caller can lock it without
    /// holding any map shard lock.
    pub fn cell(&self, rib: &str) -> Option<AccountCell> {
        self.accounts.get(rib).map(|entry| Arc::clone(entry.value()))
    }

    /// Point-in-time snapshot of one account
    pub fn get(&self, rib: &str) -> Option<Account> {
        self.cell(rib).map(|cell| cell.lock().clone())
    }

    /// Whether an account with this RIB is on record, in any status
    pub fn contains(&self, rib: &str) -> bool {
        self.accounts.contains_key(rib)
    }

    /// Set the status of an existing account
    ///
    /// Blocking and closing both go through here; closing never deletes the
    /// row.
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - Snapshot of the account after the change
    /// * `Err(LedgerError::AccountNotFound)` - If no account has this RIB
    pub fn set_status(&self, rib: &str, status: AccountStatus) -> Result<Account, LedgerError> {
        let cell = self
            .cell(rib)
            .ok_or_else(|| LedgerError::account_not_found(rib))?;
        let mut account = cell.lock();
        account.status = status;
        Ok(account.clone())
    }

    /// Snapshot of every account, sorted by RIB
    ///
    /// # Thread Safety
    ///
    /// Each row is locked briefly while it is cloned. The snapshot is
    /// consistent per account but not across accounts; a transfer committing
    /// concurrently may appear on both, one, or neither side.
    pub fn accounts_snapshot(&self) -> Vec<Account> {
        // Collect the cells first so no shard lock is held while a row
        // lock is taken; blocking on a contended row must not stall
        // writers on that row's shard.
        let cells: Vec<AccountCell> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut accounts: Vec<Account> = cells.iter().map(|cell| cell.lock().clone()).collect();
        accounts.sort_by(|a, b| a.rib.cmp(&b.rib));
        accounts
    }

    /// Number of accounts on record, closed ones included
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the store holds no accounts
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
