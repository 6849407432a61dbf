//! Balance repair: full-history recomputation of every cached total.
//!
//! An offline maintenance operation: reads the complete collections into
//! memory, recomputes every user balance and project spend total from the
//! ledger formulas, and overwrites the caches in one batched transaction.
//! Not safe to run concurrently with itself or under heavy write volume,
//! since the read and the write are not one snapshot.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, TransactionTrait};
use tracing::{debug, info};

use viatix_core::ledger::repair::{
    ProjectCorrection, UserCorrection, recompute_project_totals, recompute_user_balances,
};

use crate::entities::{allocations, expenses, projects, users};
use crate::repositories::{allocation_record, expense_record, project_record, user_record};

/// Error types for repair operations.
#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Outcome of a repair run.
#[derive(Debug, Clone)]
pub struct RepairReport {
    /// One correction per user, drifted or not.
    pub users: Vec<UserCorrection>,
    /// One correction per project, drifted or not.
    pub projects: Vec<ProjectCorrection>,
}

impl RepairReport {
    /// Number of user balances that had drifted.
    #[must_use]
    pub fn drifted_users(&self) -> usize {
        self.users.iter().filter(|c| c.is_drift()).count()
    }

    /// Number of project spend totals that had drifted.
    #[must_use]
    pub fn drifted_projects(&self) -> usize {
        self.projects.iter().filter(|c| c.is_drift()).count()
    }
}

/// Repair repository.
#[derive(Debug, Clone)]
pub struct RepairRepository {
    db: DatabaseConnection,
}

impl RepairRepository {
    /// Creates a new repair repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Recomputes and overwrites every cached balance and project total.
    ///
    /// Idempotent: a second run with no intervening writes reports zero
    /// drift and writes the same values again.
    ///
    /// # Errors
    ///
    /// Returns a database error; a failed commit leaves every cache
    /// unchanged.
    pub async fn repair(&self) -> Result<RepairReport, RepairError> {
        let user_models = users::Entity::find().all(&self.db).await?;
        let project_models = projects::Entity::find().all(&self.db).await?;
        let allocation_models = allocations::Entity::find().all(&self.db).await?;
        let expense_models = expenses::Entity::find().all(&self.db).await?;

        info!(
            users = user_models.len(),
            projects = project_models.len(),
            allocations = allocation_models.len(),
            expenses = expense_models.len(),
            "starting balance recomputation"
        );

        let user_records: Vec<_> = user_models.iter().map(user_record).collect();
        let project_records: Vec<_> = project_models.iter().map(project_record).collect();
        let allocation_records: Vec<_> =
            allocation_models.iter().map(allocation_record).collect();
        let expense_records: Vec<_> = expense_models.iter().map(expense_record).collect();

        let user_corrections =
            recompute_user_balances(&user_records, &allocation_records, &expense_records);
        let project_corrections =
            recompute_project_totals(&project_records, &expense_records);

        let txn = self.db.begin().await?;
        for correction in &user_corrections {
            if correction.is_drift() {
                info!(
                    user_id = %correction.user_id,
                    previous = %correction.previous,
                    recomputed = %correction.recomputed,
                    "balance drift repaired"
                );
            } else {
                debug!(user_id = %correction.user_id, "balance verified");
            }
            users::Entity::update_many()
                .col_expr(
                    users::Column::Balance,
                    Expr::val(correction.recomputed).into(),
                )
                .col_expr(users::Column::UpdatedAt, Expr::current_timestamp().into())
                .filter(users::Column::Id.eq(correction.user_id.into_inner()))
                .exec(&txn)
                .await?;
        }
        for correction in &project_corrections {
            if correction.is_drift() {
                info!(
                    project_id = %correction.project_id,
                    previous = %correction.previous,
                    recomputed = %correction.recomputed,
                    "project spend drift repaired"
                );
            }
            projects::Entity::update_many()
                .col_expr(
                    projects::Column::Expenses,
                    Expr::val(correction.recomputed).into(),
                )
                .col_expr(projects::Column::UpdatedAt, Expr::current_timestamp().into())
                .filter(projects::Column::Id.eq(correction.project_id.into_inner()))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        let report = RepairReport {
            users: user_corrections,
            projects: project_corrections,
        };
        info!(
            drifted_users = report.drifted_users(),
            drifted_projects = report.drifted_projects(),
            "balance recomputation finished"
        );
        Ok(report)
    }
}
