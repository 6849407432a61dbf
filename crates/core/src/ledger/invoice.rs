//! Invoice records and the lock boundary.
//!
//! Once an expense is referenced by a non-annulled invoice it is frozen: no
//! status change, edit or deletion is permitted until the invoice is
//! annulled, which releases every member in one batch. Payment status is a
//! flag on the invoice alone and never touches a balance (invoices only
//! reference already-approved expenses, whose balance effect occurred at
//! approval).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use viatix_shared::types::{ExpenseId, InvoiceId, ProjectId};

use super::error::LedgerError;
use super::types::{ExpenseRecord, ExpenseStatus};

/// Payment status of a pre-invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Issued, awaiting payment.
    Pending,
    /// Matched against a bank movement and settled.
    Paid,
    /// Cancelled; member expenses released back to the mutable state space.
    Annulled,
}

impl InvoiceStatus {
    /// Returns true while the invoice still locks its member expenses.
    #[must_use]
    pub fn locks_members(self) -> bool {
        !matches!(self, Self::Annulled)
    }
}

/// A free-standing invoice line with no backing expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    /// Line description.
    pub description: String,
    /// Line amount.
    pub amount: Decimal,
}

/// A pre-invoice over approved expenses and free-standing line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Invoice identifier.
    pub id: InvoiceId,
    /// Invoice number shown to the client.
    pub number: String,
    /// Client billed.
    pub client: Option<String>,
    /// Project the invoice draws from, if any.
    pub project_id: Option<ProjectId>,
    /// Total invoiced amount.
    pub total_amount: Decimal,
    /// Member expenses locked by this invoice.
    pub expense_ids: Vec<ExpenseId>,
    /// Free-standing line items.
    pub line_items: Vec<InvoiceLineItem>,
    /// Payment status.
    pub payment_status: InvoiceStatus,
}

/// Rejects any mutation of an invoiced expense.
///
/// Callers must run this gate before planning any row of the mutation table.
///
/// # Errors
///
/// Returns `ExpenseLocked` when `invoice_id` is set.
pub fn ensure_unlocked(expense: &ExpenseRecord) -> Result<(), LedgerError> {
    if expense.is_locked() {
        return Err(LedgerError::ExpenseLocked(expense.id));
    }
    Ok(())
}

/// Validates the expense members of a new invoice: there must be something to
/// bill, every member must be approved, and none may already be locked.
///
/// # Errors
///
/// Returns `EmptyInvoice`, `ExpenseNotApproved` or `ExpenseAlreadyInvoiced`.
pub fn validate_members(
    members: &[ExpenseRecord],
    line_items: &[InvoiceLineItem],
) -> Result<(), LedgerError> {
    if members.is_empty() && line_items.is_empty() {
        return Err(LedgerError::EmptyInvoice);
    }
    for expense in members {
        if expense.status != ExpenseStatus::Approved {
            return Err(LedgerError::ExpenseNotApproved(expense.id));
        }
        if expense.is_locked() {
            return Err(LedgerError::ExpenseAlreadyInvoiced(expense.id));
        }
    }
    Ok(())
}

/// Total amount of an invoice: member expenses plus free-standing lines.
#[must_use]
pub fn invoice_total(members: &[ExpenseRecord], line_items: &[InvoiceLineItem]) -> Decimal {
    let expense_total: Decimal = members.iter().map(|e| e.amount).sum();
    let line_total: Decimal = line_items.iter().map(|l| l.amount).sum();
    expense_total + line_total
}

/// Validates that an invoice can be annulled, returning the member ids whose
/// locks must be released in the same batch.
///
/// # Errors
///
/// Returns `InvoiceAlreadyAnnulled` when annulling twice.
pub fn plan_annulment(invoice: &InvoiceRecord) -> Result<Vec<ExpenseId>, LedgerError> {
    if invoice.payment_status == InvoiceStatus::Annulled {
        return Err(LedgerError::InvoiceAlreadyAnnulled(invoice.id));
    }
    Ok(invoice.expense_ids.clone())
}
