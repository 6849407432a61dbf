//! Property-based tests for the repair engine.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::repair::{recompute_project_totals, recompute_user_balances};
use super::types::{
    AllocationKind, AllocationRecord, ExpenseRecord, ExpenseStatus, ProjectKind, ProjectRecord,
    UserRecord, UserRole,
};
use viatix_shared::types::{AllocationId, Currency, ExpenseId, ProjectId, UserId};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
}

fn status_strategy() -> impl Strategy<Value = ExpenseStatus> {
    prop_oneof![
        Just(ExpenseStatus::Pending),
        Just(ExpenseStatus::Approved),
        Just(ExpenseStatus::Rejected),
    ]
}

/// A randomly populated record set over a fixed user/project population.
#[derive(Debug, Clone)]
struct RecordSet {
    users: Vec<UserRecord>,
    projects: Vec<ProjectRecord>,
    allocations: Vec<AllocationRecord>,
    expenses: Vec<ExpenseRecord>,
}

fn record_set_strategy() -> impl Strategy<Value = RecordSet> {
    let allocation = (0usize..3, 0usize..2, 1i64..500_000);
    let expense = (0usize..3, 0usize..2, 1i64..500_000, status_strategy(), any::<bool>());

    (
        prop::collection::vec(allocation, 0..12),
        prop::collection::vec(expense, 0..12),
        prop::collection::vec(-1_000_000i64..1_000_000, 3),
        prop::collection::vec(-1_000_000i64..1_000_000, 2),
    )
        .prop_map(|(allocs, exps, stale_balances, stale_totals)| {
            let users: Vec<UserRecord> = stale_balances
                .into_iter()
                .enumerate()
                .map(|(i, stale)| UserRecord {
                    id: UserId::new(),
                    display_name: format!("User {i}"),
                    email: format!("user{i}@example.com"),
                    role: UserRole::Professional,
                    // Deliberately wrong caches: repair must not care.
                    balance: Decimal::from(stale),
                })
                .collect();
            let projects: Vec<ProjectRecord> = stale_totals
                .into_iter()
                .enumerate()
                .map(|(i, stale)| ProjectRecord {
                    id: ProjectId::new(),
                    name: format!("Project {i}"),
                    client: None,
                    code: None,
                    kind: ProjectKind::Client,
                    expenses: Decimal::from(stale),
                })
                .collect();

            let allocations = allocs
                .into_iter()
                .map(|(u, p, amount)| AllocationRecord {
                    id: AllocationId::new(),
                    user_id: users[u].id,
                    project_id: projects[p].id,
                    amount: Decimal::from(amount),
                    date: date(),
                    kind: AllocationKind::Grant,
                })
                .collect();
            let expenses = exps
                .into_iter()
                .map(|(u, p, amount, status, is_company)| ExpenseRecord {
                    id: ExpenseId::new(),
                    user_id: if is_company { None } else { Some(users[u].id) },
                    is_company_expense: is_company,
                    project_id: Some(projects[p].id),
                    event_name: None,
                    category: None,
                    date: date(),
                    merchant: None,
                    amount: Decimal::from(amount),
                    currency: Currency::Cop,
                    status,
                    rejection_reason: None,
                    receipt_url: None,
                    invoice_id: None,
                    split_group_id: None,
                })
                .collect();

            RecordSet {
                users,
                projects,
                allocations,
                expenses,
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Idempotent repair**: applying the corrections and repairing again
    /// finds zero drift and identical balances.
    #[test]
    fn prop_repair_is_idempotent(mut set in record_set_strategy()) {
        let first = recompute_user_balances(&set.users, &set.allocations, &set.expenses);
        for correction in &first {
            let user = set
                .users
                .iter_mut()
                .find(|u| u.id == correction.user_id)
                .unwrap();
            user.balance = correction.recomputed;
        }

        let second = recompute_user_balances(&set.users, &set.allocations, &set.expenses);
        for (a, b) in first.iter().zip(second.iter()) {
            prop_assert_eq!(a.user_id, b.user_id);
            prop_assert_eq!(a.recomputed, b.recomputed);
        }
        prop_assert!(second.iter().all(|c| !c.is_drift()));
    }

    /// Repair ignores the stale cache entirely: the recomputed value is a
    /// function of the record streams alone.
    #[test]
    fn prop_repair_ignores_stale_cache(set in record_set_strategy()) {
        let mut perturbed = set.clone();
        for user in &mut perturbed.users {
            user.balance += Decimal::from(12345);
        }

        let original = recompute_user_balances(&set.users, &set.allocations, &set.expenses);
        let after = recompute_user_balances(
            &perturbed.users,
            &perturbed.allocations,
            &perturbed.expenses,
        );
        for (a, b) in original.iter().zip(after.iter()) {
            prop_assert_eq!(a.recomputed, b.recomputed);
        }
    }

    /// Project totals repair counts approved expenses only, company
    /// expenses included.
    #[test]
    fn prop_project_repair_counts_approved_only(mut set in record_set_strategy()) {
        let corrections =
            recompute_project_totals(&set.projects, &set.expenses);
        for correction in &corrections {
            let expected: Decimal = set
                .expenses
                .iter()
                .filter(|e| {
                    e.project_id == Some(correction.project_id)
                        && e.status == ExpenseStatus::Approved
                })
                .map(|e| e.amount)
                .sum();
            prop_assert_eq!(correction.recomputed, expected);
        }

        // And the pass is a fixpoint as well.
        for correction in &corrections {
            let project = set
                .projects
                .iter_mut()
                .find(|p| p.id == correction.project_id)
                .unwrap();
            project.expenses = correction.recomputed;
        }
        let second = recompute_project_totals(&set.projects, &set.expenses);
        prop_assert!(second.iter().all(|c| !c.is_drift()));
    }
}
