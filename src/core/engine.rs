//! Transfer orchestration and commit discipline
//!
//! This module provides the `TransferEngine` that validates and commits
//! transfer orders against the account store and the transaction log. It is
//! the only writer of ledger entry pairs.
//!
//! # Design
//!
//! A transfer locks both account rows for the duration of its commit. Rows
//! are always acquired in RIB order, independent of transfer direction, so
//! two opposite transfers over the same pair of accounts cannot deadlock.
//! Acquisition waits are bounded; a timeout surfaces as the retryable
//! `Busy` error instead of queueing indefinitely.
//!
//! The commit itself is staged: the debit/credit pair is appended to the
//! log first, and balances are written only after the log has accepted the
//! pair. Both rows stay locked across the two steps, so a failed append
//! aborts the transfer with every row untouched.
//!
//! # Thread Safety
//!
//! The engine takes `&self` everywhere and is shared across threads behind
//! an `Arc`. Transfers on disjoint account pairs proceed fully in parallel;
//! transfers touching a common account serialize on that account's row
//! lock. There is no global lock.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::account_store::AccountStore;
use crate::core::ledger::Ledger;
use crate::types::{
    AccountStatus, Direction, Instruction, LedgerEntry, LedgerError, TransferReceipt,
    TransferRequest,
};

/// Default bound on the wait for one account row lock, in milliseconds
pub const DEFAULT_LOCK_WAIT_MS: u64 = 500;

/// Balance floor applied to the source account of a transfer
///
/// The default places no floor: an ACTIVE account may be overdrawn
/// arbitrarily far, and an already negative account may keep transferring
/// out. A floor can be opted in per engine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OverdraftPolicy {
    /// No floor; a negative balance is a valid state
    #[default]
    Unrestricted,
    /// Reject transfers that would leave the source balance below the floor
    FloorLimit(Decimal),
}

/// Tunables for a TransferEngine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bound on the wait for each of the two row locks
    pub lock_wait: Duration,

    /// Floor policy applied to the source account once both rows are locked
    pub overdraft_policy: OverdraftPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_wait: Duration::from_millis(DEFAULT_LOCK_WAIT_MS),
            overdraft_policy: OverdraftPolicy::Unrestricted,
        }
    }
}

/// Transfer engine over an account store and a transaction log
///
/// `TransferEngine` owns the validation pipeline for transfer orders and
/// the atomic commit of balance updates plus ledger entries. It also keeps
/// a replay set of committed receipts keyed by client-supplied idempotency
/// key, so a resubmitted order returns its original receipt instead of
/// moving funds twice.
#[derive(Debug)]
pub struct TransferEngine {
    accounts: Arc<AccountStore>,
    ledger: Arc<Ledger>,
    config: EngineConfig,

    /// Receipts of committed transfers keyed by idempotency key. Only
    /// successful transfers are recorded; a failed order may be retried
    /// under the same key.
    completed: DashMap<String, TransferReceipt>,
}

impl TransferEngine {
    /// Create a new TransferEngine with the default configuration
    pub fn new(accounts: Arc<AccountStore>, ledger: Arc<Ledger>) -> Self {
        Self::with_config(accounts, ledger, EngineConfig::default())
    }

    /// Create a new TransferEngine with an explicit configuration
    pub fn with_config(
        accounts: Arc<AccountStore>,
        ledger: Arc<Ledger>,
        config: EngineConfig,
    ) -> Self {
        TransferEngine {
            accounts,
            ledger,
            config,
            completed: DashMap::new(),
        }
    }

    /// The account store this engine commits against
    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    /// The transaction log this engine appends to
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Execute a transfer order
    ///
    /// Validation runs in a fixed order: replay lookup, amount, distinct
    /// accounts, existence, then status and overdraft policy once both
    /// rows are locked. The first failing check decides the error.
    ///
    /// # Arguments
    ///
    /// * `request` - The transfer order to execute
    ///
    /// # Returns
    ///
    /// The debit and credit entries written for this transfer, or the
    /// original receipt when the idempotency key has already committed.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - The amount is not strictly positive
    /// * `SameAccount` - Source and destination are the same RIB
    /// * `AccountNotFound` - Either RIB is unknown
    /// * `AccountBlocked` - Either account is not ACTIVE
    /// * `OverdraftExceeded` - A configured floor would be crossed
    /// * `Busy` - A row lock could not be taken in time; safe to retry
    /// * `StorageFailure` - The commit failed and was rolled back; safe to
    ///   retry
    pub fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, LedgerError> {
        // Replay check comes before validation: a key that already
        // committed answers with its original receipt, whatever the
        // resubmitted payload looks like
        if let Some(cid) = request.cid.as_deref() {
            if let Some(receipt) = self.completed.get(cid) {
                tracing::debug!("Transfer {} replayed from completed set", cid);
                return Ok(receipt.clone());
            }
        }

        let outcome = self.execute(&request);
        match &outcome {
            Ok(receipt) => {
                if let Some(cid) = &request.cid {
                    self.completed.insert(cid.clone(), receipt.clone());
                }
                tracing::debug!(
                    "Transfer committed: {} -> {} amount {} correlation {}",
                    request.rib_from,
                    request.rib_to,
                    request.amount,
                    receipt.correlation_id()
                );
            }
            Err(LedgerError::StorageFailure { reason }) => {
                tracing::error!(
                    "Transfer aborted: {} -> {} amount {}: storage failure: {}",
                    request.rib_from,
                    request.rib_to,
                    request.amount,
                    reason
                );
            }
            Err(error) => {
                tracing::warn!(
                    "Transfer rejected: {} -> {} amount {}: {}",
                    request.rib_from,
                    request.rib_to,
                    request.amount,
                    error
                );
            }
        }
        outcome
    }

    /// Apply one parsed batch instruction
    ///
    /// Routes lifecycle instructions to the account store and transfer
    /// orders to [`TransferEngine::transfer`].
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying operation; see
    /// [`TransferEngine::transfer`], `AccountStore::open_account` and
    /// `AccountStore::set_status`.
    pub fn apply(&self, instruction: Instruction) -> Result<(), LedgerError> {
        match instruction {
            Instruction::Open {
                rib,
                customer,
                initial_balance,
            } => match self.accounts.open_account(rib, customer, initial_balance) {
                Ok(account) => {
                    tracing::debug!(
                        "Account {} opened for {} with balance {}",
                        account.rib,
                        account.customer,
                        account.balance
                    );
                    Ok(())
                }
                Err(error) => {
                    tracing::warn!("Open rejected: {}", error);
                    Err(error)
                }
            },
            Instruction::Transfer(request) => self.transfer(request).map(|_| ()),
            Instruction::Block { rib } => self.change_status(&rib, AccountStatus::Blocked),
            Instruction::Close { rib } => self.change_status(&rib, AccountStatus::Closed),
        }
    }

    fn change_status(&self, rib: &str, status: AccountStatus) -> Result<(), LedgerError> {
        match self.accounts.set_status(rib, status) {
            Ok(account) => {
                tracing::debug!("Account {} is now {}", account.rib, account.status);
                Ok(())
            }
            Err(error) => {
                tracing::warn!("Status change rejected: {}", error);
                Err(error)
            }
        }
    }

    fn execute(&self, request: &TransferRequest) -> Result<TransferReceipt, LedgerError> {
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(request.amount));
        }
        if request.rib_from == request.rib_to {
            return Err(LedgerError::same_account(&request.rib_from));
        }

        // Resolve both rows before locking anything. Accounts are never
        // deleted, so a row found here still exists once the locks land.
        let from_cell = self
            .accounts
            .cell(&request.rib_from)
            .ok_or_else(|| LedgerError::account_not_found(&request.rib_from))?;
        let to_cell = self
            .accounts
            .cell(&request.rib_to)
            .ok_or_else(|| LedgerError::account_not_found(&request.rib_to))?;

        // Acquire both rows in RIB order, whatever the transfer direction
        let ordered = request.rib_from < request.rib_to;
        let (first_rib, first_cell, second_rib, second_cell) = if ordered {
            (&request.rib_from, &from_cell, &request.rib_to, &to_cell)
        } else {
            (&request.rib_to, &to_cell, &request.rib_from, &from_cell)
        };

        let first_guard = first_cell
            .try_lock_for(self.config.lock_wait)
            .ok_or_else(|| LedgerError::busy(first_rib))?;
        let second_guard = second_cell
            .try_lock_for(self.config.lock_wait)
            .ok_or_else(|| LedgerError::busy(second_rib))?;

        let (mut from, mut to) = if ordered {
            (first_guard, second_guard)
        } else {
            (second_guard, first_guard)
        };

        // Statuses may have changed while we waited for the locks
        if !from.is_active() {
            return Err(LedgerError::account_blocked(&from.rib, from.status));
        }
        if !to.is_active() {
            return Err(LedgerError::account_blocked(&to.rib, to.status));
        }

        let from_balance = from
            .balance
            .checked_sub(request.amount)
            .ok_or_else(|| LedgerError::storage_failure("balance arithmetic overflow"))?;
        let to_balance = to
            .balance
            .checked_add(request.amount)
            .ok_or_else(|| LedgerError::storage_failure("balance arithmetic overflow"))?;

        if let OverdraftPolicy::FloorLimit(floor) = self.config.overdraft_policy {
            if from_balance < floor {
                return Err(LedgerError::overdraft_exceeded(
                    &from.rib,
                    from.balance,
                    request.amount,
                ));
            }
        }

        let correlation_id = request
            .cid
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let created_at = Utc::now();
        let debit = LedgerEntry {
            id: self.ledger.next_entry_id(),
            created_at,
            direction: Direction::Debit,
            amount: request.amount,
            rib: from.rib.clone(),
            acting_user: request.username.clone(),
            correlation_id: correlation_id.clone(),
        };
        let credit = LedgerEntry {
            id: self.ledger.next_entry_id(),
            created_at,
            direction: Direction::Credit,
            amount: request.amount,
            rib: to.rib.clone(),
            acting_user: request.username.clone(),
            correlation_id,
        };

        // Commit point: the pair lands in the log first, balances second.
        // Both rows stay locked across the two steps, so a rejected append
        // leaves the accounts exactly as they were.
        self.ledger.append_pair(debit.clone(), credit.clone())?;
        from.balance = from_balance;
        to.balance = to_balance;

        Ok(TransferReceipt { debit, credit })
    }
}
