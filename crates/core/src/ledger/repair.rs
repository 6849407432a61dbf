//! Full-history balance recomputation.
//!
//! The cached `user.balance` and `project.expenses` fields are denormalized
//! views of the formulas in [`super::balance`]. This module recomputes them
//! from scratch over the complete record streams; the repair repository in
//! `viatix-db` overwrites the caches with the result in one batch. Running
//! repair twice with no intervening writes is a no-op: the output is a pure
//! function of the record set.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use viatix_shared::types::{ProjectId, UserId};

use super::balance;
use super::types::{AllocationRecord, ExpenseRecord, ProjectRecord, UserRecord};

/// Recomputed balance for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCorrection {
    /// The user whose balance was recomputed.
    pub user_id: UserId,
    /// Cached balance before repair.
    pub previous: Decimal,
    /// Ground-truth balance per the ledger formulas.
    pub recomputed: Decimal,
}

impl UserCorrection {
    /// Returns true if the cache had drifted from the formulas.
    #[must_use]
    pub fn is_drift(&self) -> bool {
        self.previous != self.recomputed
    }
}

/// Recomputed approved-spend total for one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCorrection {
    /// The project whose spend cache was recomputed.
    pub project_id: ProjectId,
    /// Cached total before repair.
    pub previous: Decimal,
    /// Ground-truth total per the ledger formulas.
    pub recomputed: Decimal,
}

impl ProjectCorrection {
    /// Returns true if the cache had drifted from the formulas.
    #[must_use]
    pub fn is_drift(&self) -> bool {
        self.previous != self.recomputed
    }
}

/// Recomputes every user's balance from the full allocation and expense
/// streams. Returns one correction per user, drifted or not; the caller
/// overwrites all of them so a repeated run is a visible no-op.
#[must_use]
pub fn recompute_user_balances(
    users: &[UserRecord],
    allocations: &[AllocationRecord],
    expenses: &[ExpenseRecord],
) -> Vec<UserCorrection> {
    users
        .iter()
        .map(|user| UserCorrection {
            user_id: user.id,
            previous: user.balance,
            recomputed: balance::balance(user.id, allocations, expenses),
        })
        .collect()
}

/// Recomputes every project's approved-spend cache from the expense stream.
#[must_use]
pub fn recompute_project_totals(
    projects: &[ProjectRecord],
    expenses: &[ExpenseRecord],
) -> Vec<ProjectCorrection> {
    projects
        .iter()
        .map(|project| ProjectCorrection {
            project_id: project.id,
            previous: project.expenses,
            recomputed: balance::project_spent(project.id, expenses),
        })
        .collect()
}
