//! Ledger service: turns inputs into atomic mutation plans.
//!
//! This is the single entry point for every balance-affecting operation. The
//! service is pure and storage-free: it validates input against the current
//! record state and returns a *plan* (the record writes plus the exact cache
//! deltas) which a repository in `viatix-db` executes as one transaction.
//! Callers never compute deltas themselves.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use viatix_shared::types::{
    AllocationId, Currency, ExpenseId, ProjectId, SplitGroupId, UserId,
};

use super::effect::{
    self, BalanceEffect, ReviewEvent, deletion_effect, review_effect, submission_effect,
};
use super::error::LedgerError;
use super::invoice::ensure_unlocked;
use super::types::{
    AllocationKind, AllocationRecord, ExpenseRecord, ExpenseStatus, SubmitExpenseInput,
};
use super::validation::validate_split;

/// A new expense row to be inserted.
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    /// Identifier for the new row.
    pub id: ExpenseId,
    /// Owning user; `None` for company expenses.
    pub user_id: Option<UserId>,
    /// True for company expenses.
    pub is_company_expense: bool,
    /// Project charged, if any.
    pub project_id: Option<ProjectId>,
    /// Event the expense was incurred for.
    pub event_name: Option<String>,
    /// Expense category.
    pub category: Option<String>,
    /// Date of the expense.
    pub date: NaiveDate,
    /// Vendor name.
    pub merchant: Option<String>,
    /// Amount of this row.
    pub amount: Decimal,
    /// Currency of the claim.
    pub currency: Currency,
    /// URL of the stored receipt image, if any.
    pub receipt_url: Option<String>,
    /// Set on all rows of a split submission.
    pub split_group_id: Option<SplitGroupId>,
}

/// Plan for a submission: the rows to insert and the single credit applied
/// to the owner, atomically with them.
#[derive(Debug, Clone)]
pub struct SubmissionPlan {
    /// Expense rows to insert.
    pub drafts: Vec<ExpenseDraft>,
    /// Owner to credit; `None` for company expenses.
    pub owner: Option<UserId>,
    /// Balance credit applied to the owner in the same transaction as the
    /// inserts (the sum over all rows, applied once, never per row).
    pub credit: Decimal,
}

/// Plan for an administrator review decision.
#[derive(Debug, Clone)]
pub struct ReviewPlan {
    /// Expense being reviewed.
    pub expense_id: ExpenseId,
    /// Owner whose balance the effect touches, if any.
    pub owner: Option<UserId>,
    /// Project whose spend cache the effect touches, if any.
    pub project_id: Option<ProjectId>,
    /// Status to write.
    pub new_status: ExpenseStatus,
    /// Reason stored on rejection.
    pub rejection_reason: Option<String>,
    /// Cache deltas to apply atomically with the status write.
    pub effect: BalanceEffect,
}

/// Plan for hard-deleting an expense.
#[derive(Debug, Clone)]
pub struct DeletionPlan {
    /// Expense to delete.
    pub expense_id: ExpenseId,
    /// Owner whose balance the reversal touches, if any.
    pub owner: Option<UserId>,
    /// Project whose spend cache the reversal touches, if any.
    pub project_id: Option<ProjectId>,
    /// Cache deltas to apply atomically with the delete.
    pub effect: BalanceEffect,
}

/// A new allocation row to be inserted.
#[derive(Debug, Clone)]
pub struct AllocationDraft {
    /// Identifier for the new row.
    pub id: AllocationId,
    /// User granted the funds.
    pub user_id: UserId,
    /// Project the funds are assigned against.
    pub project_id: ProjectId,
    /// Signed amount.
    pub amount: Decimal,
    /// Date of the grant.
    pub date: NaiveDate,
    /// Kind of allocation.
    pub kind: AllocationKind,
}

/// Plan for creating an allocation.
#[derive(Debug, Clone)]
pub struct AllocationPlan {
    /// Row to insert.
    pub draft: AllocationDraft,
    /// Balance delta applied to the grantee.
    pub user_delta: Decimal,
}

/// Plan for editing an allocation in place.
#[derive(Debug, Clone)]
pub struct AllocationEditPlan {
    /// Allocation being edited.
    pub allocation_id: AllocationId,
    /// Owner after the edit.
    pub user_id: UserId,
    /// Amount after the edit.
    pub amount: Decimal,
    /// Date after the edit.
    pub date: NaiveDate,
    /// Balance deltas per affected user: one entry for a same-user amount
    /// change, two (revert old, charge new) when the grant moves between
    /// users. Zero deltas are omitted.
    pub deltas: Vec<(UserId, Decimal)>,
}

/// Plan for deleting an allocation.
#[derive(Debug, Clone)]
pub struct AllocationDeletionPlan {
    /// Allocation to delete.
    pub allocation_id: AllocationId,
    /// User whose balance is restored.
    pub user_id: UserId,
    /// Balance delta applied to that user.
    pub user_delta: Decimal,
}

/// Plan for a project-to-project fund transfer: two allocation rows whose
/// balance effects cancel, so only the per-project split changes.
#[derive(Debug, Clone)]
pub struct TransferPlan {
    /// Negative leg on the source project.
    pub outgoing: AllocationDraft,
    /// Positive leg on the destination project.
    pub incoming: AllocationDraft,
}

/// Stateless ledger service.
pub struct LedgerService;

impl LedgerService {
    /// Plans an expense submission, split or plain.
    ///
    /// # Errors
    ///
    /// Returns a validation error on empty rows, bad amounts, or a row sum
    /// outside `tolerance` of the declared total.
    pub fn plan_submission(
        input: &SubmitExpenseInput,
        tolerance: Decimal,
    ) -> Result<SubmissionPlan, LedgerError> {
        validate_split(input.declared_total, &input.rows, tolerance)?;

        let split_group_id = (input.rows.len() > 1).then(SplitGroupId::new);
        let owner = if input.is_company_expense {
            None
        } else {
            input.user_id
        };

        let drafts: Vec<ExpenseDraft> = input
            .rows
            .iter()
            .map(|row| ExpenseDraft {
                id: ExpenseId::new(),
                user_id: owner,
                is_company_expense: input.is_company_expense,
                project_id: row.project_id,
                event_name: input.event_name.clone(),
                category: input.category.clone(),
                date: input.date,
                merchant: input.merchant.clone(),
                amount: row.amount,
                currency: input.currency,
                receipt_url: input.receipt_url.clone(),
                split_group_id,
            })
            .collect();

        // Credit what the rows actually record, not the declared total: the
        // repair formulas sum row amounts, and the two paths must agree.
        let row_sum: Decimal = drafts.iter().map(|d| d.amount).sum();
        let credit = submission_effect(row_sum, input.is_company_expense).user;

        Ok(SubmissionPlan {
            drafts,
            owner,
            credit,
        })
    }

    /// Plans an approval or rejection, branching on the expense's current
    /// status.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseLocked` for invoiced expenses and `InvalidTransition`
    /// for illegal status moves.
    pub fn plan_review(
        expense: &ExpenseRecord,
        event: ReviewEvent,
        rejection_reason: Option<String>,
    ) -> Result<ReviewPlan, LedgerError> {
        ensure_unlocked(expense)?;

        let (new_status, effect) =
            review_effect(expense.status, event, expense.amount, expense.is_company_expense)?;

        Ok(ReviewPlan {
            expense_id: expense.id,
            owner: expense.user_id,
            project_id: expense.project_id,
            new_status,
            rejection_reason: if new_status == ExpenseStatus::Rejected {
                rejection_reason
            } else {
                None
            },
            effect,
        })
    }

    /// Plans a hard deletion, reversing exactly what the current status ever
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseLocked` for invoiced expenses.
    pub fn plan_deletion(expense: &ExpenseRecord) -> Result<DeletionPlan, LedgerError> {
        ensure_unlocked(expense)?;

        Ok(DeletionPlan {
            expense_id: expense.id,
            owner: expense.user_id,
            project_id: expense.project_id,
            effect: deletion_effect(expense.status, expense.amount, expense.is_company_expense),
        })
    }

    /// Plans a new viatico grant.
    ///
    /// # Errors
    ///
    /// Returns `ZeroAmount`. Negative grants are allowed as manual
    /// corrections; zero grants are noise.
    pub fn plan_allocation(
        user_id: UserId,
        project_id: ProjectId,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<AllocationPlan, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        Ok(AllocationPlan {
            draft: AllocationDraft {
                id: AllocationId::new(),
                user_id,
                project_id,
                amount,
                date,
                kind: AllocationKind::Grant,
            },
            user_delta: effect::allocation_created(amount),
        })
    }

    /// Plans an edit of an existing allocation: amount, date and owner may
    /// all change. Moving the grant between users reverts the full old
    /// amount on the old user and charges the full new amount on the new.
    ///
    /// # Errors
    ///
    /// Returns `ZeroAmount` for a zero new amount.
    pub fn plan_allocation_edit(
        allocation: &AllocationRecord,
        new_user_id: UserId,
        new_amount: Decimal,
        new_date: NaiveDate,
    ) -> Result<AllocationEditPlan, LedgerError> {
        if new_amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        let mut deltas = Vec::with_capacity(2);
        if allocation.user_id == new_user_id {
            let delta = effect::allocation_amended(allocation.amount, new_amount);
            if !delta.is_zero() {
                deltas.push((new_user_id, delta));
            }
        } else {
            deltas.push((allocation.user_id, effect::allocation_deleted(allocation.amount)));
            deltas.push((new_user_id, effect::allocation_created(new_amount)));
        }

        Ok(AllocationEditPlan {
            allocation_id: allocation.id,
            user_id: new_user_id,
            amount: new_amount,
            date: new_date,
            deltas,
        })
    }

    /// Plans the deletion of an allocation, restoring the grantee's balance.
    #[must_use]
    pub fn plan_allocation_deletion(allocation: &AllocationRecord) -> AllocationDeletionPlan {
        AllocationDeletionPlan {
            allocation_id: allocation.id,
            user_id: allocation.user_id,
            user_delta: effect::allocation_deleted(allocation.amount),
        }
    }

    /// Plans a fund transfer between two projects for the same user.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveTransfer` or `SameProjectTransfer`.
    pub fn plan_transfer(
        user_id: UserId,
        source_project: ProjectId,
        target_project: ProjectId,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<TransferPlan, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveTransfer);
        }
        if source_project == target_project {
            return Err(LedgerError::SameProjectTransfer);
        }

        Ok(TransferPlan {
            outgoing: AllocationDraft {
                id: AllocationId::new(),
                user_id,
                project_id: source_project,
                amount: -amount,
                date,
                kind: AllocationKind::TransferOut,
            },
            incoming: AllocationDraft {
                id: AllocationId::new(),
                user_id,
                project_id: target_project,
                amount,
                date,
                kind: AllocationKind::TransferIn,
            },
        })
    }
}
