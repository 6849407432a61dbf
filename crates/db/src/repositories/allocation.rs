//! Allocation repository: grants, edits, deletions and transfers.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use viatix_core::ledger::service::{AllocationDraft, LedgerService};
use viatix_core::ledger::LedgerError;
use viatix_shared::types::{ProjectId, UserId};

use crate::entities::allocations;
use crate::repositories::{allocation_kind_to_db, allocation_record, apply_user_delta};

/// Error types for allocation operations.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    /// Allocation not found.
    #[error("Allocation not found: {0}")]
    NotFound(Uuid),

    /// Ledger validation or policy error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Allocation repository.
#[derive(Debug, Clone)]
pub struct AllocationRepository {
    db: DatabaseConnection,
}

impl AllocationRepository {
    /// Creates a new allocation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Grants a viatico: inserts the allocation and debits the grantee's
    /// balance in one transaction.
    ///
    /// # Errors
    ///
    /// Returns a ledger validation error or a database error.
    pub async fn grant(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<allocations::Model, AllocationError> {
        let plan = LedgerService::plan_allocation(
            UserId::from_uuid(user_id),
            ProjectId::from_uuid(project_id),
            amount,
            date,
        )?;

        let txn = self.db.begin().await?;
        let model = insert_draft(&txn, &plan.draft).await?;
        apply_user_delta(&txn, user_id, plan.user_delta).await?;
        txn.commit().await?;

        Ok(model)
    }

    /// Edits an allocation's amount, date or grantee, applying the
    /// delta-of-deltas (or the full revert-and-recharge when the grant moves
    /// between users).
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, a ledger validation error, or a database error.
    pub async fn edit(
        &self,
        allocation_id: Uuid,
        new_user_id: Uuid,
        new_amount: Decimal,
        new_date: NaiveDate,
    ) -> Result<allocations::Model, AllocationError> {
        let model = self.require(allocation_id).await?;
        let record = allocation_record(&model);
        let plan = LedgerService::plan_allocation_edit(
            &record,
            UserId::from_uuid(new_user_id),
            new_amount,
            new_date,
        )?;

        let txn = self.db.begin().await?;

        for (user, delta) in &plan.deltas {
            apply_user_delta(&txn, user.into_inner(), *delta).await?;
        }

        let mut active: allocations::ActiveModel = model.into();
        active.user_id = Set(plan.user_id.into_inner());
        active.amount = Set(plan.amount);
        active.date = Set(plan.date);
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Deletes an allocation, restoring the grantee's balance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn delete(&self, allocation_id: Uuid) -> Result<(), AllocationError> {
        let model = self.require(allocation_id).await?;
        let record = allocation_record(&model);
        let plan = LedgerService::plan_allocation_deletion(&record);

        let txn = self.db.begin().await?;
        apply_user_delta(&txn, plan.user_id.into_inner(), plan.user_delta).await?;
        allocations::Entity::delete_by_id(allocation_id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(())
    }

    /// Reassigns previously granted funds between two projects for the same
    /// user: inserts the `-t`/`+t` leg pair. The user's balance is untouched
    /// since the legs cancel.
    ///
    /// # Errors
    ///
    /// Returns a ledger validation error or a database error.
    pub async fn transfer(
        &self,
        user_id: Uuid,
        source_project: Uuid,
        target_project: Uuid,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<(allocations::Model, allocations::Model), AllocationError> {
        let plan = LedgerService::plan_transfer(
            UserId::from_uuid(user_id),
            ProjectId::from_uuid(source_project),
            ProjectId::from_uuid(target_project),
            amount,
            date,
        )?;

        let txn = self.db.begin().await?;
        let outgoing = insert_draft(&txn, &plan.outgoing).await?;
        let incoming = insert_draft(&txn, &plan.incoming).await?;
        txn.commit().await?;

        Ok((outgoing, incoming))
    }

    /// Lists a user's allocations, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<allocations::Model>, AllocationError> {
        Ok(allocations::Entity::find()
            .filter(allocations::Column::UserId.eq(user_id))
            .order_by_desc(allocations::Column::Date)
            .all(&self.db)
            .await?)
    }

    /// Lists a project's allocations, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<allocations::Model>, AllocationError> {
        Ok(allocations::Entity::find()
            .filter(allocations::Column::ProjectId.eq(project_id))
            .order_by_desc(allocations::Column::Date)
            .all(&self.db)
            .await?)
    }

    async fn require(&self, allocation_id: Uuid) -> Result<allocations::Model, AllocationError> {
        allocations::Entity::find_by_id(allocation_id)
            .one(&self.db)
            .await?
            .ok_or(AllocationError::NotFound(allocation_id))
    }
}

async fn insert_draft(
    txn: &DatabaseTransaction,
    draft: &AllocationDraft,
) -> Result<allocations::Model, DbErr> {
    let model = allocations::ActiveModel {
        id: Set(draft.id.into_inner()),
        user_id: Set(draft.user_id.into_inner()),
        project_id: Set(draft.project_id.into_inner()),
        amount: Set(draft.amount),
        date: Set(draft.date),
        kind: Set(allocation_kind_to_db(draft.kind)),
        created_at: Set(Utc::now().into()),
    };
    model.insert(txn).await
}
