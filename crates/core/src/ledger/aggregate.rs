//! Read-side project accounting rollups.
//!
//! These breakdowns are recomputed from the raw record streams on every call,
//! never from the cached `user.balance` / `project.expenses` fields, so they
//! double as a drift detector for the incremental protocol.
//!
//! Note the deliberate asymmetry inherited from the source behavior:
//! `justified` includes pending expenses, while the cached project spend (and
//! `spent` here) counts approved only.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use viatix_shared::types::{ProjectId, UserId};

use super::types::{AllocationRecord, ExpenseRecord, ExpenseStatus};

/// Totals for one project bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Breakdown {
    /// Sum of allocation amounts assigned to the bucket.
    pub assigned: Decimal,
    /// Sum of non-rejected expense amounts (pending included).
    pub justified: Decimal,
    /// Sum of approved expense amounts.
    pub spent: Decimal,
    /// Sum of rejected expense amounts, totaled separately for audit.
    pub rejected: Decimal,
}

impl Breakdown {
    /// Remaining assigned funds after everything justified so far.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.assigned - self.justified
    }

    fn add_allocation(&mut self, amount: Decimal) {
        self.assigned += amount;
    }

    fn add_expense(&mut self, amount: Decimal, status: ExpenseStatus) {
        if status.counts_toward_balance() {
            self.justified += amount;
        } else {
            self.rejected += amount;
        }
        if status.charges_project() {
            self.spent += amount;
        }
    }
}

/// Breakdown for a single project.
#[must_use]
pub fn project_breakdown(
    project: ProjectId,
    allocations: &[AllocationRecord],
    expenses: &[ExpenseRecord],
) -> Breakdown {
    let mut breakdown = Breakdown::default();
    for allocation in allocations.iter().filter(|a| a.project_id == project) {
        breakdown.add_allocation(allocation.amount);
    }
    for expense in expenses.iter().filter(|e| e.project_id == Some(project)) {
        breakdown.add_expense(expense.amount, expense.status);
    }
    breakdown
}

/// Breakdown of every record grouped by project. Expenses without a project
/// land in the `None` (unassigned) bucket.
#[must_use]
pub fn breakdown_by_project(
    allocations: &[AllocationRecord],
    expenses: &[ExpenseRecord],
) -> BTreeMap<Option<ProjectId>, Breakdown> {
    let mut buckets: BTreeMap<Option<ProjectId>, Breakdown> = BTreeMap::new();
    for allocation in allocations {
        buckets
            .entry(Some(allocation.project_id))
            .or_default()
            .add_allocation(allocation.amount);
    }
    for expense in expenses {
        buckets
            .entry(expense.project_id)
            .or_default()
            .add_expense(expense.amount, expense.status);
    }
    buckets
}

/// Per-project breakdown of a single user's records, for the user detail
/// view. Company expenses carry no owner and therefore never appear here.
#[must_use]
pub fn user_breakdown(
    user: UserId,
    allocations: &[AllocationRecord],
    expenses: &[ExpenseRecord],
) -> BTreeMap<Option<ProjectId>, Breakdown> {
    let user_allocations: Vec<AllocationRecord> = allocations
        .iter()
        .filter(|a| a.user_id == user)
        .cloned()
        .collect();
    let user_expenses: Vec<ExpenseRecord> = expenses
        .iter()
        .filter(|e| e.user_id == Some(user))
        .cloned()
        .collect();
    breakdown_by_project(&user_allocations, &user_expenses)
}
