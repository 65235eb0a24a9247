//! Error types for the Rust Ledger Engine
//!
//! This module defines all error types that can occur while processing
//! transfers and instruction files. Errors are designed to be descriptive
//! and user-friendly for CLI output.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: File not found, permission denied, etc.
//! - **CSV Parsing Errors**: Malformed CSV, invalid instructions, etc.
//! - **Transfer Errors**: Unknown account, blocked account, self transfer, etc.
//! - **Contention/Storage Errors**: Lock wait timeout, failed atomic write
//!
//! Every transfer error leaves both accounts and the ledger unchanged.
//! [`LedgerError::is_retryable`] separates the kinds a caller may safely
//! retry from the kinds that will fail again unchanged.

use super::account::AccountStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ledger engine
///
/// This enum represents all possible errors that can occur during
/// transfer processing. Each variant includes relevant context
/// to help diagnose and resolve the issue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// File not found at the specified path
    ///
    /// This is a fatal error that prevents processing from starting.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    ///
    /// This is typically a fatal error (file permissions, disk full, etc.).
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// This is a recoverable error - the malformed record is skipped
    /// and processing continues with the next record.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Unknown instruction type encountered in the input file
    ///
    /// This is a recoverable error - the record is skipped and
    /// processing continues.
    #[error("Unknown instruction type '{op}'")]
    UnknownInstruction {
        /// The unrecognized instruction type string
        op: String,
    },

    /// A required field is missing for an instruction
    ///
    /// This is a recoverable error - the record is skipped.
    #[error("{op} instruction requires a {field}")]
    MissingField {
        /// Instruction type
        op: String,
        /// Name of the missing field
        field: String,
    },

    /// Amount field could not be parsed or is over-precise
    ///
    /// This is a recoverable error - the record is skipped.
    #[error("Invalid amount '{amount}' for {op} instruction")]
    MalformedAmount {
        /// Instruction type
        op: String,
        /// The unparseable amount string
        amount: String,
    },

    /// Transfer amount is not strictly positive
    ///
    /// This is a recoverable error - the transfer is rejected and
    /// no state is touched. Do not retry unchanged.
    #[error("Invalid transfer amount {amount}: must be strictly positive")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Source and destination accounts are the same
    ///
    /// This is a recoverable error - the transfer is rejected.
    #[error("Transfer from account {rib} to itself is not allowed")]
    SameAccount {
        /// The account named on both sides
        rib: String,
    },

    /// No account exists for the given RIB
    ///
    /// This is a recoverable error - the operation is rejected and
    /// the other account, if any, is untouched.
    #[error("Account {rib} not found")]
    AccountNotFound {
        /// The unknown account identifier
        rib: String,
    },

    /// Account exists but is not ACTIVE
    ///
    /// Raised for both BLOCKED and CLOSED accounts, on either side of a
    /// transfer. This is a recoverable error - the transfer is rejected.
    #[error("Account {rib} is {status}")]
    AccountBlocked {
        /// The non-active account identifier
        rib: String,
        /// Its actual status
        status: AccountStatus,
    },

    /// The configured overdraft policy rejected the debit
    ///
    /// Only raised when a floor limit is configured; by default negative
    /// balances are a valid outcome. This is a recoverable error.
    #[error("Overdraft limit exceeded for account {rib}: balance {balance}, requested {requested}")]
    OverdraftExceeded {
        /// The debited account
        rib: String,
        /// Balance before the transfer
        balance: Decimal,
        /// Requested transfer amount
        requested: Decimal,
    },

    /// An account with this RIB already exists
    ///
    /// This is a recoverable error - the open instruction is rejected
    /// and the existing account is untouched.
    #[error("Account {rib} already exists")]
    DuplicateAccount {
        /// The conflicting account identifier
        rib: String,
    },

    /// A row lock could not be acquired within the bounded wait
    ///
    /// The transfer produced no state change and is safe to retry.
    #[error("Account {rib} is busy: lock wait timed out")]
    Busy {
        /// The contended account identifier
        rib: String,
    },

    /// The atomic write phase could not complete
    ///
    /// Always resolves to a full rollback; no partial leg is ever visible.
    /// Safe to retry once the storage condition clears.
    #[error("Storage failure: {reason}")]
    StorageFailure {
        /// What prevented the commit
        reason: String,
    },
}

// Conversion from io::Error to LedgerError
impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to LedgerError
impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        // Extract line number if available
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    /// Create a SameAccount error
    pub fn same_account(rib: &str) -> Self {
        LedgerError::SameAccount {
            rib: rib.to_string(),
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(rib: &str) -> Self {
        LedgerError::AccountNotFound {
            rib: rib.to_string(),
        }
    }

    /// Create an AccountBlocked error
    pub fn account_blocked(rib: &str, status: AccountStatus) -> Self {
        LedgerError::AccountBlocked {
            rib: rib.to_string(),
            status,
        }
    }

    /// Create an OverdraftExceeded error
    pub fn overdraft_exceeded(rib: &str, balance: Decimal, requested: Decimal) -> Self {
        LedgerError::OverdraftExceeded {
            rib: rib.to_string(),
            balance,
            requested,
        }
    }

    /// Create a DuplicateAccount error
    pub fn duplicate_account(rib: &str) -> Self {
        LedgerError::DuplicateAccount {
            rib: rib.to_string(),
        }
    }

    /// Create a Busy error
    pub fn busy(rib: &str) -> Self {
        LedgerError::Busy {
            rib: rib.to_string(),
        }
    }

    /// Create a StorageFailure error
    pub fn storage_failure(reason: &str) -> Self {
        LedgerError::StorageFailure {
            reason: reason.to_string(),
        }
    }

    /// Create an UnknownInstruction error
    pub fn unknown_instruction(op: &str) -> Self {
        LedgerError::UnknownInstruction { op: op.to_string() }
    }

    /// Create a MissingField error
    pub fn missing_field(op: &str, field: &str) -> Self {
        LedgerError::MissingField {
            op: op.to_string(),
            field: field.to_string(),
        }
    }

    /// Create a MalformedAmount error
    pub fn malformed_amount(op: &str, amount: &str) -> Self {
        LedgerError::MalformedAmount {
            op: op.to_string(),
            amount: amount.to_string(),
        }
    }

    /// Whether a caller may safely retry the same request
    ///
    /// `Busy` and `StorageFailure` left no state behind and depend on
    /// transient conditions; every other kind will fail again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Busy { .. } | LedgerError::StorageFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case::file_not_found(
        LedgerError::FileNotFound { path: "test.csv".to_string() },
        "File not found: test.csv"
    )]
    #[case::io_error(
        LedgerError::IoError { message: "Permission denied".to_string() },
        "I/O error: Permission denied"
    )]
    #[case::parse_error_with_line(
        LedgerError::ParseError { line: Some(42), message: "Invalid field".to_string() },
        "CSV parse error at line 42: Invalid field"
    )]
    #[case::parse_error_without_line(
        LedgerError::ParseError { line: None, message: "Invalid field".to_string() },
        "CSV parse error: Invalid field"
    )]
    #[case::unknown_instruction(
        LedgerError::UnknownInstruction { op: "withdraw".to_string() },
        "Unknown instruction type 'withdraw'"
    )]
    #[case::missing_field(
        LedgerError::MissingField { op: "transfer".to_string(), field: "rib_to".to_string() },
        "transfer instruction requires a rib_to"
    )]
    #[case::malformed_amount(
        LedgerError::MalformedAmount { op: "open".to_string(), amount: "ten".to_string() },
        "Invalid amount 'ten' for open instruction"
    )]
    #[case::invalid_amount(
        LedgerError::InvalidAmount { amount: Decimal::ZERO },
        "Invalid transfer amount 0: must be strictly positive"
    )]
    #[case::same_account(
        LedgerError::SameAccount { rib: "RIB_1".to_string() },
        "Transfer from account RIB_1 to itself is not allowed"
    )]
    #[case::account_not_found(
        LedgerError::AccountNotFound { rib: "RIB_404".to_string() },
        "Account RIB_404 not found"
    )]
    #[case::account_blocked(
        LedgerError::AccountBlocked { rib: "RIB_5".to_string(), status: AccountStatus::Blocked },
        "Account RIB_5 is BLOCKED"
    )]
    #[case::account_closed(
        LedgerError::AccountBlocked { rib: "RIB_5".to_string(), status: AccountStatus::Closed },
        "Account RIB_5 is CLOSED"
    )]
    #[case::overdraft_exceeded(
        LedgerError::OverdraftExceeded { rib: "RIB_9".to_string(), balance: Decimal::new(-25_000, 0), requested: Decimal::new(100, 0) },
        "Overdraft limit exceeded for account RIB_9: balance -25000, requested 100"
    )]
    #[case::duplicate_account(
        LedgerError::DuplicateAccount { rib: "RIB_1".to_string() },
        "Account RIB_1 already exists"
    )]
    #[case::busy(
        LedgerError::Busy { rib: "RIB_2".to_string() },
        "Account RIB_2 is busy: lock wait timed out"
    )]
    #[case::storage_failure(
        LedgerError::StorageFailure { reason: "balance arithmetic overflow".to_string() },
        "Storage failure: balance arithmetic overflow"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::same_account(
        LedgerError::same_account("RIB_1"),
        LedgerError::SameAccount { rib: "RIB_1".to_string() }
    )]
    #[case::account_not_found(
        LedgerError::account_not_found("RIB_404"),
        LedgerError::AccountNotFound { rib: "RIB_404".to_string() }
    )]
    #[case::account_blocked(
        LedgerError::account_blocked("RIB_5", AccountStatus::Closed),
        LedgerError::AccountBlocked { rib: "RIB_5".to_string(), status: AccountStatus::Closed }
    )]
    #[case::overdraft_exceeded(
        LedgerError::overdraft_exceeded("RIB_9", Decimal::ZERO, Decimal::ONE),
        LedgerError::OverdraftExceeded { rib: "RIB_9".to_string(), balance: Decimal::ZERO, requested: Decimal::ONE }
    )]
    #[case::busy(
        LedgerError::busy("RIB_2"),
        LedgerError::Busy { rib: "RIB_2".to_string() }
    )]
    fn test_helper_functions(#[case] result: LedgerError, #[case] expected: LedgerError) {
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case::busy(LedgerError::busy("RIB_1"), true)]
    #[case::storage_failure(LedgerError::storage_failure("disk full"), true)]
    #[case::invalid_amount(LedgerError::invalid_amount(Decimal::ZERO), false)]
    #[case::same_account(LedgerError::same_account("RIB_1"), false)]
    #[case::account_not_found(LedgerError::account_not_found("RIB_404"), false)]
    #[case::account_blocked(LedgerError::account_blocked("RIB_5", AccountStatus::Blocked), false)]
    #[case::overdraft(LedgerError::overdraft_exceeded("RIB_9", Decimal::ZERO, Decimal::ONE), false)]
    fn test_retry_classification(#[case] error: LedgerError, #[case] retryable: bool) {
        assert_eq!(error.is_retryable(), retryable);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: LedgerError = io_error.into();
        assert!(matches!(error, LedgerError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }
}
