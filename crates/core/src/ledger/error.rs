//! Ledger error types for validation and policy errors.
//!
//! Validation errors reject bad input before any write; policy errors reject
//! structurally valid input that the current record state forbids. Both are
//! resolved synchronously and block the action. Infrastructure errors live in
//! the repository layer (`viatix-db`), never here.

use rust_decimal::Decimal;
use thiserror::Error;
use viatix_shared::types::{ExpenseId, InvoiceId};

use super::effect::ReviewEvent;
use super::types::ExpenseStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount cannot be zero.
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Expense amount cannot be negative.
    #[error("Expense amount cannot be negative")]
    NegativeAmount,

    /// A submission must have at least one row.
    #[error("Submission must have at least one row")]
    EmptySubmission,

    /// The rows of a split submission do not add up to the declared total.
    #[error("Split rows sum to {sum}, declared total is {declared} (tolerance {tolerance})")]
    SplitMismatch {
        /// Total declared by the submitter.
        declared: Decimal,
        /// Actual sum over the rows.
        sum: Decimal,
        /// Allowed absolute difference.
        tolerance: Decimal,
    },

    /// Transfer amount must be positive.
    #[error("Transfer amount must be positive")]
    NonPositiveTransfer,

    /// Transfer source and destination must be different projects.
    #[error("Transfer source and destination must be different projects")]
    SameProjectTransfer,

    // ========== Policy Errors ==========
    /// The expense is referenced by a non-annulled invoice and is frozen.
    #[error("Expense {0} is locked by an invoice and cannot be modified")]
    ExpenseLocked(ExpenseId),

    /// The review event is not valid from the expense's current status.
    #[error("Cannot {event} an expense in status {from:?}")]
    InvalidTransition {
        /// Current status of the expense.
        from: ExpenseStatus,
        /// The attempted review event.
        event: ReviewEvent,
    },

    /// An invoice must reference at least one expense or line item.
    #[error("Invoice must reference at least one expense or line item")]
    EmptyInvoice,

    /// Only approved expenses can be invoiced.
    #[error("Expense {0} is not approved and cannot be invoiced")]
    ExpenseNotApproved(ExpenseId),

    /// The expense is already referenced by another invoice.
    #[error("Expense {0} is already referenced by another invoice")]
    ExpenseAlreadyInvoiced(ExpenseId),

    /// The invoice has already been annulled.
    #[error("Invoice {0} is already annulled")]
    InvoiceAlreadyAnnulled(InvoiceId),
}

impl LedgerError {
    /// Returns the error code for API responses and logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::EmptySubmission => "EMPTY_SUBMISSION",
            Self::SplitMismatch { .. } => "SPLIT_MISMATCH",
            Self::NonPositiveTransfer => "NON_POSITIVE_TRANSFER",
            Self::SameProjectTransfer => "SAME_PROJECT_TRANSFER",
            Self::ExpenseLocked(_) => "EXPENSE_LOCKED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::EmptyInvoice => "EMPTY_INVOICE",
            Self::ExpenseNotApproved(_) => "EXPENSE_NOT_APPROVED",
            Self::ExpenseAlreadyInvoiced(_) => "EXPENSE_ALREADY_INVOICED",
            Self::InvoiceAlreadyAnnulled(_) => "INVOICE_ALREADY_ANNULLED",
        }
    }

    /// Returns true for policy errors (valid input refused by record state),
    /// false for validation errors (malformed input).
    #[must_use]
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            Self::ExpenseLocked(_)
                | Self::InvalidTransition { .. }
                | Self::EmptyInvoice
                | Self::ExpenseNotApproved(_)
                | Self::ExpenseAlreadyInvoiced(_)
                | Self::InvoiceAlreadyAnnulled(_)
        )
    }
}
