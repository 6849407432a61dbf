//! Input validation for ledger operations.
//!
//! Validation failures reject a submission before any write reaches the
//! store.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::SplitRow;

/// Validates a claimed expense amount: non-zero and non-negative.
///
/// # Errors
///
/// Returns `ZeroAmount` or `NegativeAmount`.
pub fn validate_expense_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount.is_zero() {
        return Err(LedgerError::ZeroAmount);
    }
    if amount.is_sign_negative() {
        return Err(LedgerError::NegativeAmount);
    }
    Ok(())
}

/// Validates the rows of a submission against the declared total.
///
/// Every row amount must be a valid expense amount, and the row sum must be
/// within `tolerance` of the declared total (split conservation). A plain
/// submission is a single row carrying the whole amount, for which the check
/// is trivially exact.
///
/// # Errors
///
/// Returns `EmptySubmission`, a per-row amount error, or `SplitMismatch`.
pub fn validate_split(
    declared_total: Decimal,
    rows: &[SplitRow],
    tolerance: Decimal,
) -> Result<(), LedgerError> {
    if rows.is_empty() {
        return Err(LedgerError::EmptySubmission);
    }
    validate_expense_amount(declared_total)?;
    for row in rows {
        validate_expense_amount(row.amount)?;
    }

    let sum: Decimal = rows.iter().map(|r| r.amount).sum();
    if (sum - declared_total).abs() > tolerance {
        return Err(LedgerError::SplitMismatch {
            declared: declared_total,
            sum,
            tolerance,
        });
    }

    Ok(())
}
