//! Balance formulas over raw record streams.
//!
//! SIGN CONVENTION (load-bearing, defined here and only here):
//! a user's balance is the net amount the company owes the user.
//!
//! - Submitting an expense *raises* the balance: the user spent money and is
//!   owed justification or reimbursement for it.
//! - Receiving an allocation *lowers* the balance: the user now holds company
//!   float they have yet to render.
//!
//! Positive balance = company owes the user ("saldo a favor").
//! Negative balance = user holds unrendered float ("fondos por rendir").
//!
//! Every other module applies deltas derived from these formulas; none may
//! re-derive signs locally. The repair engine recomputes cached balances from
//! these exact functions, so the incremental protocol in `effect` must agree
//! with them at every step.

use rust_decimal::Decimal;
use viatix_shared::types::{ProjectId, UserId};

use super::types::{AllocationRecord, ExpenseRecord};

/// Sum of allocation amounts granted to a user, over all projects and kinds.
///
/// Transfer legs carry signed amounts, so a transfer pair nets to zero here.
#[must_use]
pub fn total_allocated(user: UserId, allocations: &[AllocationRecord]) -> Decimal {
    allocations
        .iter()
        .filter(|a| a.user_id == user)
        .map(|a| a.amount)
        .sum()
}

/// Sum of expense amounts a user has justified: every non-rejected,
/// non-company expense counts, pending included.
#[must_use]
pub fn total_justified(user: UserId, expenses: &[ExpenseRecord]) -> Decimal {
    expenses
        .iter()
        .filter(|e| {
            e.user_id == Some(user) && e.status.counts_toward_balance() && !e.is_company_expense
        })
        .map(|e| e.amount)
        .sum()
}

/// Net amount the company owes the user.
#[must_use]
pub fn balance(
    user: UserId,
    allocations: &[AllocationRecord],
    expenses: &[ExpenseRecord],
) -> Decimal {
    total_justified(user, expenses) - total_allocated(user, allocations)
}

/// Sum of approved expense amounts charged to a project.
///
/// This is the ground truth behind the `project.expenses` cache, which moves
/// only on transitions in and out of `approved`.
#[must_use]
pub fn project_spent(project: ProjectId, expenses: &[ExpenseRecord]) -> Decimal {
    expenses
        .iter()
        .filter(|e| e.project_id == Some(project) && e.status.charges_project())
        .map(|e| e.amount)
        .sum()
}

/// Sum of allocation amounts assigned against a project.
#[must_use]
pub fn project_assigned(project: ProjectId, allocations: &[AllocationRecord]) -> Decimal {
    allocations
        .iter()
        .filter(|a| a.project_id == project)
        .map(|a| a.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{AllocationKind, ExpenseStatus};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use viatix_shared::types::{AllocationId, Currency, ExpenseId};

    fn alloc(user: UserId, project: ProjectId, amount: Decimal) -> AllocationRecord {
        AllocationRecord {
            id: AllocationId::new(),
            user_id: user,
            project_id: project,
            amount,
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            kind: AllocationKind::Grant,
        }
    }

    fn expense(
        user: UserId,
        project: Option<ProjectId>,
        amount: Decimal,
        status: ExpenseStatus,
    ) -> ExpenseRecord {
        ExpenseRecord {
            id: ExpenseId::new(),
            user_id: Some(user),
            is_company_expense: false,
            project_id: project,
            event_name: None,
            category: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            merchant: None,
            amount,
            currency: Currency::Cop,
            status,
            rejection_reason: None,
            receipt_url: None,
            invoice_id: None,
            split_group_id: None,
        }
    }

    #[test]
    fn test_balance_of_user_with_no_records() {
        let user = UserId::new();
        assert_eq!(balance(user, &[], &[]), Decimal::ZERO);
    }

    #[test]
    fn test_allocation_lowers_balance() {
        let user = UserId::new();
        let project = ProjectId::new();
        let allocations = vec![alloc(user, project, dec!(100000))];

        assert_eq!(total_allocated(user, &allocations), dec!(100000));
        assert_eq!(balance(user, &allocations, &[]), dec!(-100000));
    }

    #[test]
    fn test_pending_expense_raises_balance() {
        let user = UserId::new();
        let project = ProjectId::new();
        let allocations = vec![alloc(user, project, dec!(100000))];
        let expenses = vec![expense(user, Some(project), dec!(30000), ExpenseStatus::Pending)];

        assert_eq!(total_justified(user, &expenses), dec!(30000));
        assert_eq!(balance(user, &allocations, &expenses), dec!(-70000));
    }

    #[test]
    fn test_rejected_expense_does_not_count() {
        let user = UserId::new();
        let expenses = vec![
            expense(user, None, dec!(30000), ExpenseStatus::Approved),
            expense(user, None, dec!(5000), ExpenseStatus::Rejected),
        ];

        assert_eq!(total_justified(user, &expenses), dec!(30000));
    }

    #[test]
    fn test_company_expense_excluded_from_user_balance() {
        let user = UserId::new();
        let project = ProjectId::new();
        let mut company = expense(user, Some(project), dec!(19140), ExpenseStatus::Approved);
        company.is_company_expense = true;
        company.user_id = None;
        let expenses = vec![company];

        assert_eq!(total_justified(user, &expenses), Decimal::ZERO);
        // But the project spend still sees it.
        assert_eq!(project_spent(project, &expenses), dec!(19140));
    }

    #[test]
    fn test_project_spent_counts_approved_only() {
        let user = UserId::new();
        let project = ProjectId::new();
        let expenses = vec![
            expense(user, Some(project), dec!(30000), ExpenseStatus::Approved),
            expense(user, Some(project), dec!(15000), ExpenseStatus::Pending),
            expense(user, Some(project), dec!(7180), ExpenseStatus::Rejected),
        ];

        assert_eq!(project_spent(project, &expenses), dec!(30000));
    }

    #[test]
    fn test_transfer_pair_nets_to_zero_on_user() {
        let user = UserId::new();
        let src = ProjectId::new();
        let dst = ProjectId::new();
        let allocations = vec![
            alloc(user, src, dec!(250000)),
            alloc(user, src, dec!(-40000)),
            alloc(user, dst, dec!(40000)),
        ];

        assert_eq!(total_allocated(user, &allocations), dec!(250000));
        assert_eq!(project_assigned(src, &allocations), dec!(210000));
        assert_eq!(project_assigned(dst, &allocations), dec!(40000));
    }

    #[test]
    fn test_other_users_records_are_ignored() {
        let user = UserId::new();
        let other = UserId::new();
        let project = ProjectId::new();
        let allocations = vec![alloc(other, project, dec!(50000))];
        let expenses = vec![expense(other, Some(project), dec!(20000), ExpenseStatus::Pending)];

        assert_eq!(balance(user, &allocations, &expenses), Decimal::ZERO);
    }
}
