//! CSV format handling for batch instructions and report output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvInstruction structure for deserialization
//! - Conversion from CSV rows to domain instructions
//! - Balances and statement report serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{Account, Instruction, LedgerEntry, LedgerError, TransferRequest};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV row structure for deserialization
///
/// Matches the input CSV format with columns: type, rib, rib_to, amount,
/// user, cid. All columns apart from the operation and the primary RIB are
/// optional because lifecycle instructions leave them empty.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvInstruction {
    #[serde(rename = "type")]
    pub op: String,
    pub rib: String,
    pub rib_to: Option<String>,
    pub amount: Option<String>,
    pub user: Option<String>,
    pub cid: Option<String>,
}

/// Convert a CsvInstruction to a domain Instruction
///
/// This function:
/// - Parses the operation name (case insensitive)
/// - Validates that the fields the operation needs are present
/// - Parses the amount string into a Decimal with at most four decimal
///   places
///
/// Business rules stay out of here: a transfer with a non-positive amount
/// or an unknown RIB converts fine and is rejected by the engine.
///
/// # Arguments
///
/// * `csv` - The deserialized CSV row
///
/// # Errors
///
/// * `UnknownInstruction` - The operation name is not recognized
/// * `MissingField` - A field the operation requires is empty or absent
/// * `MalformedAmount` - The amount does not parse, or carries more than
///   four decimal places
pub fn convert_csv_instruction(csv: CsvInstruction) -> Result<Instruction, LedgerError> {
    let op = csv.op.to_lowercase();
    match op.as_str() {
        "open" => {
            let rib = required_field(Some(csv.rib), &op, "rib")?;
            let customer = required_field(csv.user, &op, "user")?;
            let initial_balance = parse_amount(csv.amount, &op)?;
            Ok(Instruction::Open {
                rib,
                customer,
                initial_balance,
            })
        }
        "transfer" => {
            let rib_from = required_field(Some(csv.rib), &op, "rib")?;
            let rib_to = required_field(csv.rib_to, &op, "rib_to")?;
            let amount = parse_amount(csv.amount, &op)?;
            let username = required_field(csv.user, &op, "user")?;
            let request = match csv.cid.filter(|cid| !cid.trim().is_empty()) {
                Some(cid) => TransferRequest::with_cid(rib_from, rib_to, amount, username, cid),
                None => TransferRequest::new(rib_from, rib_to, amount, username),
            };
            Ok(Instruction::Transfer(request))
        }
        "block" => {
            let rib = required_field(Some(csv.rib), &op, "rib")?;
            Ok(Instruction::Block { rib })
        }
        "close" => {
            let rib = required_field(Some(csv.rib), &op, "rib")?;
            Ok(Instruction::Close { rib })
        }
        _ => Err(LedgerError::unknown_instruction(&csv.op)),
    }
}

fn required_field(value: Option<String>, op: &str, field: &str) -> Result<String, LedgerError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(LedgerError::missing_field(op, field)),
    }
}

fn parse_amount(value: Option<String>, op: &str) -> Result<Decimal, LedgerError> {
    let raw = match value {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Err(LedgerError::missing_field(op, "amount")),
    };

    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| LedgerError::malformed_amount(op, raw.trim()))?;

    // Ledger amounts carry at most four decimal places
    if amount.scale() > 4 {
        return Err(LedgerError::malformed_amount(op, raw.trim()));
    }

    Ok(amount)
}

/// Write account balances to CSV format
///
/// Writes accounts in CSV format with columns: rib, customer, balance,
/// status. Accounts are sorted by RIB for deterministic output.
///
/// # Arguments
///
/// * `accounts` - Slice of account states to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Errors
///
/// Returns an error if a write to the underlying output fails.
pub fn write_balances_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["rib", "customer", "balance", "status"])?;

    // Sort accounts by RIB for deterministic output
    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by(|a, b| a.rib.cmp(&b.rib));

    for account in sorted_accounts {
        writer.write_record(&[
            account.rib.clone(),
            account.customer.clone(),
            account.balance.to_string(),
            account.status.to_string(),
        ])?;
    }

    writer.flush()?;

    Ok(())
}

/// Write an account statement to CSV format
///
/// Writes ledger entries in CSV format with columns: id, created_at,
/// direction, amount, rib, user, correlation_id. Timestamps are rendered
/// as RFC 3339. Entries are written in the order given; the query service
/// hands them over oldest first.
///
/// # Arguments
///
/// * `entries` - Slice of ledger entries to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Errors
///
/// Returns an error if a write to the underlying output fails.
pub fn write_statement_csv(
    entries: &[LedgerEntry],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record([
        "id",
        "created_at",
        "direction",
        "amount",
        "rib",
        "user",
        "correlation_id",
    ])?;

    for entry in entries {
        writer.write_record(&[
            entry.id.to_string(),
            entry.created_at.to_rfc3339(),
            entry.direction.to_string(),
            entry.amount.to_string(),
            entry.rib.clone(),
            entry.acting_user.clone(),
            entry.correlation_id.clone(),
        ])?;
    }

    writer.flush()?;

    Ok(())
}
