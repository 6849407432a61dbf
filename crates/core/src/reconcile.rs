//! Bank statement import and invoice matching.
//!
//! The importer maps a bank-exported CSV to plain movement records; the
//! matcher joins movements to pending invoices by amount tolerance. The only
//! ledger-visible effect of a confirmed match is flipping the invoice's
//! payment status to paid, which the invoice repository performs. Balances
//! never move here.

use std::io::Read;
use std::str::FromStr as _;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use viatix_shared::types::InvoiceId;

use crate::ledger::invoice::{InvoiceRecord, InvoiceStatus};

/// One movement row from a bank statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankMovement {
    /// Booking date.
    pub date: NaiveDate,
    /// Statement description.
    pub description: String,
    /// Movement amount (deposits positive).
    pub amount: Decimal,
    /// Name of the bank the statement came from.
    pub bank: String,
}

/// A proposed match between a movement and a pending invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationMatch {
    /// The matched invoice.
    pub invoice_id: InvoiceId,
    /// The movement that settles it.
    pub movement: BankMovement,
    /// Absolute difference between movement and invoice amounts.
    pub difference: Decimal,
}

/// Errors while importing a bank statement.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The CSV could not be parsed at all.
    #[error("Invalid CSV: {0}")]
    InvalidCsv(#[from] csv::Error),

    /// A row had an unparseable field.
    #[error("Invalid movement row {row}: {reason}")]
    InvalidRow {
        /// 1-based row number.
        row: usize,
        /// What failed to parse.
        reason: String,
    },
}

/// Reads bank movements from a CSV export with `date,description,amount`
/// columns (header row expected; extra columns ignored).
///
/// # Errors
///
/// Returns `ImportError` on malformed CSV or unparseable fields.
pub fn read_movements<R: Read>(reader: R, bank: &str) -> Result<Vec<BankMovement>, ImportError> {
    let mut movements = Vec::new();

    for (i, record) in csv::Reader::from_reader(reader).records().enumerate() {
        let row = i + 1;
        let record = record?;

        let raw_date = record.get(0).unwrap_or("");
        let raw_description = record.get(1).unwrap_or("");
        let raw_amount = record.get(2).unwrap_or("");

        let date = NaiveDate::from_str(raw_date).map_err(|e| ImportError::InvalidRow {
            row,
            reason: format!("date '{raw_date}': {e}"),
        })?;
        let amount = Decimal::from_str(raw_amount).map_err(|e| ImportError::InvalidRow {
            row,
            reason: format!("amount '{raw_amount}': {e}"),
        })?;

        movements.push(BankMovement {
            date,
            description: raw_description.to_string(),
            amount,
            bank: bank.to_string(),
        });
    }

    Ok(movements)
}

/// Joins movements to pending invoices by amount tolerance. Each invoice and
/// each movement is consumed at most once; invoices are tried in the order
/// given, movements likewise, and the first pair within tolerance wins.
#[must_use]
pub fn match_movements(
    movements: &[BankMovement],
    invoices: &[InvoiceRecord],
    tolerance: Decimal,
) -> Vec<ReconciliationMatch> {
    let mut matches = Vec::new();
    let mut taken = vec![false; movements.len()];

    for invoice in invoices
        .iter()
        .filter(|i| i.payment_status == InvoiceStatus::Pending)
    {
        let candidate = movements.iter().enumerate().find(|(i, m)| {
            !taken[*i] && (m.amount - invoice.total_amount).abs() <= tolerance
        });

        if let Some((i, movement)) = candidate {
            taken[i] = true;
            matches.push(ReconciliationMatch {
                invoice_id: invoice.id,
                movement: movement.clone(),
                difference: (movement.amount - invoice.total_amount).abs(),
            });
        }
    }

    matches
}
