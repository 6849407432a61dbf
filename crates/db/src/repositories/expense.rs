//! Expense repository: submission, review, deletion and queries.
//!
//! Every mutation here is one atomic transaction pairing the record write
//! with the exact cache deltas from the ledger plan.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use viatix_core::ledger::effect::ReviewEvent;
use viatix_core::ledger::service::LedgerService;
use viatix_core::ledger::types::SubmitExpenseInput;
use viatix_core::ledger::LedgerError;

use crate::entities::{expenses, sea_orm_active_enums::ExpenseStatus as DbExpenseStatus};
use crate::repositories::{
    apply_project_delta, apply_user_delta, expense_record, expense_status_to_db,
};

/// Error types for expense operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    /// Expense not found.
    #[error("Expense not found: {0}")]
    NotFound(Uuid),

    /// Ledger validation or policy error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submits an expense (plain or split across projects).
    ///
    /// Inserts every row and applies the owner's submission credit in the
    /// same transaction; a split is one unit of work, never `n` independent
    /// credits.
    ///
    /// # Errors
    ///
    /// Returns a ledger validation error or a database error.
    pub async fn submit(
        &self,
        input: SubmitExpenseInput,
        tolerance: Decimal,
    ) -> Result<Vec<expenses::Model>, ExpenseError> {
        let plan = LedgerService::plan_submission(&input, tolerance)?;

        let txn = self.db.begin().await?;
        let now = Utc::now().into();
        let mut models = Vec::with_capacity(plan.drafts.len());

        for draft in &plan.drafts {
            let model = expenses::ActiveModel {
                id: Set(draft.id.into_inner()),
                user_id: Set(draft.user_id.map(viatix_shared::types::UserId::into_inner)),
                is_company_expense: Set(draft.is_company_expense),
                project_id: Set(draft
                    .project_id
                    .map(viatix_shared::types::ProjectId::into_inner)),
                event_name: Set(draft.event_name.clone()),
                category: Set(draft.category.clone()),
                date: Set(draft.date),
                merchant: Set(draft.merchant.clone()),
                tax_id: Set(None),
                amount: Set(draft.amount),
                currency: Set(draft.currency.to_string()),
                status: Set(DbExpenseStatus::Pending),
                rejection_reason: Set(None),
                receipt_url: Set(draft.receipt_url.clone()),
                voucher_url: Set(None),
                invoice_id: Set(None),
                split_group_id: Set(draft
                    .split_group_id
                    .map(viatix_shared::types::SplitGroupId::into_inner)),
                created_at: Set(now),
                updated_at: Set(now),
            };
            models.push(model.insert(&txn).await?);
        }

        if let Some(owner) = plan.owner {
            apply_user_delta(&txn, owner.into_inner(), plan.credit).await?;
        }

        txn.commit().await?;
        Ok(models)
    }

    /// Approves or rejects an expense, branching on its current status.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, a ledger policy error (locked expense, illegal
    /// transition), or a database error.
    pub async fn review(
        &self,
        expense_id: Uuid,
        event: ReviewEvent,
        rejection_reason: Option<String>,
    ) -> Result<expenses::Model, ExpenseError> {
        let model = self.require(expense_id).await?;
        let record = expense_record(&model);
        let plan = LedgerService::plan_review(&record, event, rejection_reason)?;

        let txn = self.db.begin().await?;

        let mut active: expenses::ActiveModel = model.into();
        active.status = Set(expense_status_to_db(plan.new_status));
        active.rejection_reason = Set(plan.rejection_reason.clone());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        if let Some(owner) = plan.owner {
            apply_user_delta(&txn, owner.into_inner(), plan.effect.user).await?;
        }
        if let Some(project) = plan.project_id {
            apply_project_delta(&txn, project.into_inner(), plan.effect.project).await?;
        }

        txn.commit().await?;

        info!(
            expense_id = %expense_id,
            status = ?plan.new_status,
            "expense reviewed"
        );
        Ok(updated)
    }

    /// Hard-deletes an expense, reversing exactly the effects its current
    /// status ever applied.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `ExpenseLocked` for invoiced expenses, or a
    /// database error.
    pub async fn delete(&self, expense_id: Uuid) -> Result<(), ExpenseError> {
        let model = self.require(expense_id).await?;
        let record = expense_record(&model);
        let plan = LedgerService::plan_deletion(&record)?;

        let txn = self.db.begin().await?;

        if let Some(owner) = plan.owner {
            apply_user_delta(&txn, owner.into_inner(), plan.effect.user).await?;
        }
        if let Some(project) = plan.project_id {
            apply_project_delta(&txn, project.into_inner(), plan.effect.project).await?;
        }
        expenses::Entity::delete_by_id(expense_id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Finds an expense by id.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn find_by_id(
        &self,
        expense_id: Uuid,
    ) -> Result<Option<expenses::Model>, ExpenseError> {
        Ok(expenses::Entity::find_by_id(expense_id).one(&self.db).await?)
    }

    /// Lists all pending expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_pending(&self) -> Result<Vec<expenses::Model>, ExpenseError> {
        Ok(expenses::Entity::find()
            .filter(expenses::Column::Status.eq(DbExpenseStatus::Pending))
            .order_by_desc(expenses::Column::Date)
            .all(&self.db)
            .await?)
    }

    /// Lists a user's expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<expenses::Model>, ExpenseError> {
        Ok(expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .order_by_desc(expenses::Column::Date)
            .all(&self.db)
            .await?)
    }

    /// Lists a project's expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<expenses::Model>, ExpenseError> {
        Ok(expenses::Entity::find()
            .filter(expenses::Column::ProjectId.eq(project_id))
            .order_by_desc(expenses::Column::Date)
            .all(&self.db)
            .await?)
    }

    /// Lists approved expenses of a project that are not yet invoiced,
    /// the candidate pool for pre-invoice generation.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_invoiceable(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<expenses::Model>, ExpenseError> {
        Ok(expenses::Entity::find()
            .filter(expenses::Column::ProjectId.eq(project_id))
            .filter(expenses::Column::Status.eq(DbExpenseStatus::Approved))
            .filter(expenses::Column::InvoiceId.is_null())
            .order_by_desc(expenses::Column::Date)
            .all(&self.db)
            .await?)
    }

    async fn require(&self, expense_id: Uuid) -> Result<expenses::Model, ExpenseError> {
        self.find_by_id(expense_id)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))
    }
}
