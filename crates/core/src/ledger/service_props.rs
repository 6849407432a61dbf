//! Property-based tests for the mutation protocol.
//!
//! The central property is *ledger agreement*: after any sequence of
//! operations applied through `LedgerService` plans, every cached balance
//! must equal the value recomputed from scratch by the formulas in
//! `balance`. A small in-memory world stands in for the document store and
//! applies plans exactly the way the repositories do.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::balance;
use super::effect::ReviewEvent;
use super::service::{
    AllocationDraft, DeletionPlan, LedgerService, ReviewPlan, SubmissionPlan,
};
use super::types::{
    AllocationRecord, ExpenseRecord, ExpenseStatus, ProjectKind, ProjectRecord, SplitRow,
    SubmitExpenseInput, UserRecord, UserRole,
};
use viatix_shared::types::{Currency, ProjectId, UserId};

/// In-memory stand-in for the document store. Applies mutation plans the
/// same way the repositories do: record write plus cache increments, all or
/// nothing.
#[derive(Debug, Clone, Default)]
struct World {
    users: Vec<UserRecord>,
    projects: Vec<ProjectRecord>,
    allocations: Vec<AllocationRecord>,
    expenses: Vec<ExpenseRecord>,
}

impl World {
    fn with_population(n_users: usize, n_projects: usize) -> Self {
        let users = (0..n_users)
            .map(|i| UserRecord {
                id: UserId::new(),
                display_name: format!("User {i}"),
                email: format!("user{i}@example.com"),
                role: UserRole::Professional,
                balance: Decimal::ZERO,
            })
            .collect();
        let projects = (0..n_projects)
            .map(|i| ProjectRecord {
                id: ProjectId::new(),
                name: format!("Project {i}"),
                client: None,
                code: None,
                kind: ProjectKind::Client,
                expenses: Decimal::ZERO,
            })
            .collect();
        Self {
            users,
            projects,
            allocations: Vec::new(),
            expenses: Vec::new(),
        }
    }

    fn credit_user(&mut self, user: UserId, delta: Decimal) {
        if let Some(u) = self.users.iter_mut().find(|u| u.id == user) {
            u.balance += delta;
        }
    }

    fn credit_project(&mut self, project: ProjectId, delta: Decimal) {
        if let Some(p) = self.projects.iter_mut().find(|p| p.id == project) {
            p.expenses += delta;
        }
    }

    fn apply_submission(&mut self, plan: SubmissionPlan) {
        for draft in &plan.drafts {
            self.expenses.push(ExpenseRecord {
                id: draft.id,
                user_id: draft.user_id,
                is_company_expense: draft.is_company_expense,
                project_id: draft.project_id,
                event_name: draft.event_name.clone(),
                category: draft.category.clone(),
                date: draft.date,
                merchant: draft.merchant.clone(),
                amount: draft.amount,
                currency: draft.currency,
                status: ExpenseStatus::Pending,
                rejection_reason: None,
                receipt_url: draft.receipt_url.clone(),
                invoice_id: None,
                split_group_id: draft.split_group_id,
            });
        }
        if let Some(owner) = plan.owner {
            self.credit_user(owner, plan.credit);
        }
    }

    fn apply_review(&mut self, plan: ReviewPlan) {
        let expense = self
            .expenses
            .iter_mut()
            .find(|e| e.id == plan.expense_id)
            .expect("expense exists");
        expense.status = plan.new_status;
        expense.rejection_reason = plan.rejection_reason.clone();

        if let Some(owner) = plan.owner {
            self.credit_user(owner, plan.effect.user);
        }
        if let Some(project) = plan.project_id {
            self.credit_project(project, plan.effect.project);
        }
    }

    fn apply_deletion(&mut self, plan: DeletionPlan) {
        self.expenses.retain(|e| e.id != plan.expense_id);
        if let Some(owner) = plan.owner {
            self.credit_user(owner, plan.effect.user);
        }
        if let Some(project) = plan.project_id {
            self.credit_project(project, plan.effect.project);
        }
    }

    fn insert_allocation(&mut self, draft: &AllocationDraft) {
        self.allocations.push(AllocationRecord {
            id: draft.id,
            user_id: draft.user_id,
            project_id: draft.project_id,
            amount: draft.amount,
            date: draft.date,
            kind: draft.kind,
        });
    }

    /// Every cached value must match the recomputed ground truth.
    fn assert_agreement(&self) -> Result<(), TestCaseError> {
        for user in &self.users {
            let recomputed = balance::balance(user.id, &self.allocations, &self.expenses);
            prop_assert_eq!(
                user.balance,
                recomputed,
                "cached balance drifted for {}",
                user.display_name
            );
        }
        for project in &self.projects {
            let recomputed = balance::project_spent(project.id, &self.expenses);
            prop_assert_eq!(
                project.expenses,
                recomputed,
                "cached spend drifted for {}",
                project.name
            );
        }
        Ok(())
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
}

fn submit(world: &mut World, user_idx: usize, project_idx: usize, amount: Decimal) {
    let user = world.users[user_idx % world.users.len()].id;
    let project = world.projects[project_idx % world.projects.len()].id;
    let input = SubmitExpenseInput {
        user_id: Some(user),
        is_company_expense: false,
        declared_total: amount,
        currency: Currency::Cop,
        date: date(),
        event_name: None,
        category: None,
        merchant: None,
        receipt_url: None,
        rows: vec![SplitRow {
            project_id: Some(project),
            amount,
        }],
    };
    let plan = LedgerService::plan_submission(&input, dec!(1)).expect("valid submission");
    world.apply_submission(plan);
}

/// One step of a randomly generated operation sequence.
#[derive(Debug, Clone)]
enum Op {
    Submit { user: usize, project: usize, amount: i64 },
    Approve { expense: usize },
    Reject { expense: usize },
    DeleteExpense { expense: usize },
    Allocate { user: usize, project: usize, amount: i64 },
    DeleteAllocation { allocation: usize },
    EditAllocation { allocation: usize, new_user: usize, amount: i64 },
    Transfer { user: usize, src: usize, dst: usize, amount: i64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let idx = 0usize..8;
    let amount = 1i64..200_000;
    prop_oneof![
        (idx.clone(), idx.clone(), amount.clone())
            .prop_map(|(user, project, amount)| Op::Submit { user, project, amount }),
        idx.clone().prop_map(|expense| Op::Approve { expense }),
        idx.clone().prop_map(|expense| Op::Reject { expense }),
        idx.clone().prop_map(|expense| Op::DeleteExpense { expense }),
        (idx.clone(), idx.clone(), amount.clone())
            .prop_map(|(user, project, amount)| Op::Allocate { user, project, amount }),
        idx.clone().prop_map(|allocation| Op::DeleteAllocation { allocation }),
        (idx.clone(), idx.clone(), amount.clone())
            .prop_map(|(allocation, new_user, amount)| Op::EditAllocation {
                allocation,
                new_user,
                amount
            }),
        (idx.clone(), idx.clone(), idx, amount)
            .prop_map(|(user, src, dst, amount)| Op::Transfer { user, src, dst, amount }),
    ]
}

fn apply_op(world: &mut World, op: &Op) {
    match *op {
        Op::Submit { user, project, amount } => {
            submit(world, user, project, Decimal::from(amount));
        }
        Op::Approve { expense } | Op::Reject { expense } => {
            if world.expenses.is_empty() {
                return;
            }
            let target = world.expenses[expense % world.expenses.len()].clone();
            let event = if matches!(op, Op::Approve { .. }) {
                ReviewEvent::Approve
            } else {
                ReviewEvent::Reject
            };
            // Illegal transitions are refused with no effect; that refusal
            // is itself part of the protocol under test.
            if let Ok(plan) = LedgerService::plan_review(&target, event, None) {
                world.apply_review(plan);
            }
        }
        Op::DeleteExpense { expense } => {
            if world.expenses.is_empty() {
                return;
            }
            let target = world.expenses[expense % world.expenses.len()].clone();
            if let Ok(plan) = LedgerService::plan_deletion(&target) {
                world.apply_deletion(plan);
            }
        }
        Op::Allocate { user, project, amount } => {
            let user = world.users[user % world.users.len()].id;
            let project = world.projects[project % world.projects.len()].id;
            let plan = LedgerService::plan_allocation(user, project, Decimal::from(amount), date())
                .expect("valid allocation");
            world.insert_allocation(&plan.draft);
            world.credit_user(user, plan.user_delta);
        }
        Op::DeleteAllocation { allocation } => {
            if world.allocations.is_empty() {
                return;
            }
            let target = world.allocations[allocation % world.allocations.len()].clone();
            let plan = LedgerService::plan_allocation_deletion(&target);
            world.allocations.retain(|a| a.id != plan.allocation_id);
            world.credit_user(plan.user_id, plan.user_delta);
        }
        Op::EditAllocation { allocation, new_user, amount } => {
            if world.allocations.is_empty() {
                return;
            }
            let target = world.allocations[allocation % world.allocations.len()].clone();
            let new_user = world.users[new_user % world.users.len()].id;
            let plan =
                LedgerService::plan_allocation_edit(&target, new_user, Decimal::from(amount), date())
                    .expect("valid edit");
            for (user, delta) in &plan.deltas {
                world.credit_user(*user, *delta);
            }
            let record = world
                .allocations
                .iter_mut()
                .find(|a| a.id == plan.allocation_id)
                .expect("allocation exists");
            record.user_id = plan.user_id;
            record.amount = plan.amount;
            record.date = plan.date;
        }
        Op::Transfer { user, src, dst, amount } => {
            let user = world.users[user % world.users.len()].id;
            let src = world.projects[src % world.projects.len()].id;
            let dst = world.projects[dst % world.projects.len()].id;
            if let Ok(plan) =
                LedgerService::plan_transfer(user, src, dst, Decimal::from(amount), date())
            {
                world.insert_allocation(&plan.outgoing);
                world.insert_allocation(&plan.incoming);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Ledger agreement**: after any operation sequence, every cached
    /// balance and project total equals the value recomputed from scratch.
    #[test]
    fn prop_incremental_matches_recomputed(
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut world = World::with_population(4, 3);
        for op in &ops {
            apply_op(&mut world, op);
            world.assert_agreement()?;
        }
    }

    /// **Inverse operations cancel**: submit-then-delete restores both
    /// caches exactly, from any reachable status.
    #[test]
    fn prop_submit_then_delete_is_identity(
        amount in 1i64..1_000_000,
        approve_first in any::<bool>(),
    ) {
        let mut world = World::with_population(1, 1);
        let before = world.clone();

        submit(&mut world, 0, 0, Decimal::from(amount));
        let expense = world.expenses[0].clone();
        if approve_first {
            let plan = LedgerService::plan_review(&expense, ReviewEvent::Approve, None).unwrap();
            world.apply_review(plan);
        }
        let expense = world.expenses[0].clone();
        let plan = LedgerService::plan_deletion(&expense).unwrap();
        world.apply_deletion(plan);

        prop_assert_eq!(world.users[0].balance, before.users[0].balance);
        prop_assert_eq!(world.projects[0].expenses, before.projects[0].expenses);
    }

    /// **Inverse operations cancel**: create-then-delete of an allocation
    /// restores the user's balance exactly.
    #[test]
    fn prop_allocate_then_delete_is_identity(amount in 1i64..1_000_000) {
        let mut world = World::with_population(1, 1);
        let user = world.users[0].id;
        let project = world.projects[0].id;

        let plan =
            LedgerService::plan_allocation(user, project, Decimal::from(amount), date()).unwrap();
        world.insert_allocation(&plan.draft);
        world.credit_user(user, plan.user_delta);

        let target = world.allocations[0].clone();
        let plan = LedgerService::plan_allocation_deletion(&target);
        world.allocations.retain(|a| a.id != plan.allocation_id);
        world.credit_user(plan.user_id, plan.user_delta);

        prop_assert_eq!(world.users[0].balance, Decimal::ZERO);
        world.assert_agreement()?;
    }

    /// **Rejection reverses submission credit**: submit-reject nets to the
    /// pre-submission balance, and submit-approve-reject nets both caches.
    #[test]
    fn prop_rejection_reverses_credit(
        amount in 1i64..1_000_000,
        approve_first in any::<bool>(),
    ) {
        let mut world = World::with_population(1, 1);
        submit(&mut world, 0, 0, Decimal::from(amount));

        if approve_first {
            let expense = world.expenses[0].clone();
            let plan = LedgerService::plan_review(&expense, ReviewEvent::Approve, None).unwrap();
            world.apply_review(plan);
        }
        let expense = world.expenses[0].clone();
        let plan = LedgerService::plan_review(
            &expense,
            ReviewEvent::Reject,
            Some("duplicate".to_string()),
        )
        .unwrap();
        world.apply_review(plan);

        prop_assert_eq!(world.users[0].balance, Decimal::ZERO);
        prop_assert_eq!(world.projects[0].expenses, Decimal::ZERO);
        world.assert_agreement()?;
    }

    /// **Transfer neutrality**: a transfer changes neither the user balance
    /// nor the sum of assigned funds across projects, only the split.
    #[test]
    fn prop_transfer_is_neutral(
        grant in 1i64..1_000_000,
        transfer in 1i64..1_000_000,
    ) {
        let mut world = World::with_population(1, 2);
        let user = world.users[0].id;
        let src = world.projects[0].id;
        let dst = world.projects[1].id;

        let plan =
            LedgerService::plan_allocation(user, src, Decimal::from(grant), date()).unwrap();
        world.insert_allocation(&plan.draft);
        world.credit_user(user, plan.user_delta);
        let balance_before = world.users[0].balance;
        let assigned_before = balance::project_assigned(src, &world.allocations)
            + balance::project_assigned(dst, &world.allocations);

        let plan =
            LedgerService::plan_transfer(user, src, dst, Decimal::from(transfer), date()).unwrap();
        world.insert_allocation(&plan.outgoing);
        world.insert_allocation(&plan.incoming);

        prop_assert_eq!(world.users[0].balance, balance_before);
        let assigned_after = balance::project_assigned(src, &world.allocations)
            + balance::project_assigned(dst, &world.allocations);
        prop_assert_eq!(assigned_after, assigned_before);
        prop_assert_eq!(
            balance::project_assigned(dst, &world.allocations),
            Decimal::from(transfer)
        );
        world.assert_agreement()?;
    }

    /// **Split conservation**: an accepted split creates rows summing to the
    /// declared total within tolerance, credited to the owner as one unit.
    #[test]
    fn prop_split_conserves_total(
        parts in prop::collection::vec(1i64..100_000, 2..6),
    ) {
        let mut world = World::with_population(1, 3);
        let user = world.users[0].id;
        let total: i64 = parts.iter().sum();

        let rows: Vec<SplitRow> = parts
            .iter()
            .enumerate()
            .map(|(i, &amount)| SplitRow {
                project_id: Some(world.projects[i % world.projects.len()].id),
                amount: Decimal::from(amount),
            })
            .collect();
        let input = SubmitExpenseInput {
            user_id: Some(user),
            is_company_expense: false,
            declared_total: Decimal::from(total),
            currency: Currency::Cop,
            date: date(),
            event_name: None,
            category: None,
            merchant: None,
            receipt_url: None,
            rows,
        };

        let plan = LedgerService::plan_submission(&input, dec!(1)).unwrap();
        let row_sum: Decimal = plan.drafts.iter().map(|d| d.amount).sum();
        prop_assert_eq!(row_sum, Decimal::from(total));
        prop_assert_eq!(plan.credit, Decimal::from(total));

        world.apply_submission(plan);
        prop_assert_eq!(world.users[0].balance, Decimal::from(total));
        world.assert_agreement()?;
    }
}

#[cfg(test)]
mod scenario {
    use super::*;
    use viatix_shared::types::InvoiceId;

    /// The worked numeric scenario: grant 100000, submit 30000, approve,
    /// then reject the approved expense as a duplicate.
    #[test]
    fn test_grant_submit_approve_reject_scenario() {
        let mut world = World::with_population(1, 1);
        let user = world.users[0].id;
        let project = world.projects[0].id;

        let plan = LedgerService::plan_allocation(user, project, dec!(100000), date()).unwrap();
        world.insert_allocation(&plan.draft);
        world.credit_user(user, plan.user_delta);
        assert_eq!(world.users[0].balance, dec!(-100000));

        submit(&mut world, 0, 0, dec!(30000));
        assert_eq!(world.users[0].balance, dec!(-70000));
        assert_eq!(world.projects[0].expenses, Decimal::ZERO);

        let expense = world.expenses[0].clone();
        let plan = LedgerService::plan_review(&expense, ReviewEvent::Approve, None).unwrap();
        world.apply_review(plan);
        assert_eq!(world.users[0].balance, dec!(-70000));
        assert_eq!(world.projects[0].expenses, dec!(30000));

        let expense = world.expenses[0].clone();
        let plan = LedgerService::plan_review(
            &expense,
            ReviewEvent::Reject,
            Some("duplicate".to_string()),
        )
        .unwrap();
        world.apply_review(plan);
        assert_eq!(world.users[0].balance, dec!(-100000));
        assert_eq!(world.projects[0].expenses, Decimal::ZERO);
        assert_eq!(world.expenses[0].status, ExpenseStatus::Rejected);

        world.assert_agreement().unwrap();
    }

    /// **Lock enforcement**: an invoiced expense refuses every mutation with
    /// zero cache movement; after annulment the same operation succeeds.
    #[test]
    fn test_locked_expense_is_frozen_until_annulment() {
        let mut world = World::with_population(1, 1);
        submit(&mut world, 0, 0, dec!(30000));
        let expense = world.expenses[0].clone();
        let plan = LedgerService::plan_review(&expense, ReviewEvent::Approve, None).unwrap();
        world.apply_review(plan);

        let balance_before = world.users[0].balance;
        let spent_before = world.projects[0].expenses;

        world.expenses[0].invoice_id = Some(InvoiceId::new());
        let locked = world.expenses[0].clone();
        assert!(LedgerService::plan_review(&locked, ReviewEvent::Reject, None).is_err());
        assert!(LedgerService::plan_deletion(&locked).is_err());
        assert_eq!(world.users[0].balance, balance_before);
        assert_eq!(world.projects[0].expenses, spent_before);

        // Annulment clears the lock; the same operations go through again.
        world.expenses[0].invoice_id = None;
        let released = world.expenses[0].clone();
        let plan = LedgerService::plan_review(&released, ReviewEvent::Reject, None).unwrap();
        world.apply_review(plan);
        assert_eq!(world.users[0].balance, Decimal::ZERO);
        assert_eq!(world.projects[0].expenses, Decimal::ZERO);
    }
}
