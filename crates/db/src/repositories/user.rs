//! User repository: account CRUD, per-user summaries and account migration.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::BTreeMap;
use tracing::warn;
use uuid::Uuid;

use viatix_core::ledger::aggregate::{self, Breakdown};
use viatix_shared::types::{ProjectId, UserId};

use crate::entities::{
    allocations, expenses, sea_orm_active_enums::UserRole as DbUserRole, users,
};
use crate::repositories::{allocation_record, expense_record};

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// A user with this email already exists.
    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a user with a zero starting balance.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEmail` or a database error.
    pub async fn create(
        &self,
        display_name: &str,
        email: &str,
        role: DbUserRole,
        code: Option<String>,
    ) -> Result<users::Model, UserError> {
        if self.find_by_email(email).await?.is_some() {
            return Err(UserError::DuplicateEmail(email.to_string()));
        }

        let now = Utc::now().into();
        let model = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            display_name: Set(display_name.to_string()),
            email: Set(email.to_string()),
            code: Set(code),
            role: Set(role),
            balance: Set(rust_decimal::Decimal::ZERO),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(&self.db).await?)
    }

    /// Finds a user by id.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<users::Model>, UserError> {
        Ok(users::Entity::find_by_id(user_id).one(&self.db).await?)
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, UserError> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    /// Lists all users ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(&self) -> Result<Vec<users::Model>, UserError> {
        Ok(users::Entity::find()
            .order_by_asc(users::Column::DisplayName)
            .all(&self.db)
            .await?)
    }

    /// Per-project breakdown of a user's allocations and expenses, computed
    /// from the raw streams rather than any cached field.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn summary(
        &self,
        user_id: Uuid,
    ) -> Result<BTreeMap<Option<ProjectId>, Breakdown>, UserError> {
        let allocation_models = allocations::Entity::find()
            .filter(allocations::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        let expense_models = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;

        let allocation_records: Vec<_> =
            allocation_models.iter().map(allocation_record).collect();
        let expense_records: Vec<_> = expense_models.iter().map(expense_record).collect();

        Ok(aggregate::user_breakdown(
            UserId::from_uuid(user_id),
            &allocation_records,
            &expense_records,
        ))
    }

    /// Relocates an account to a new identifier: copies the row (balance
    /// verbatim), re-points the user's expenses and allocations, and deletes
    /// the old row, all in one transaction.
    ///
    /// The copied balance is NOT re-verified against the ledger formulas
    /// here; the repair job is the reconciliation path after a migration.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for the old id or a database error.
    pub async fn migrate_account(
        &self,
        old_id: Uuid,
        new_id: Uuid,
    ) -> Result<users::Model, UserError> {
        let old = self
            .find_by_id(old_id)
            .await?
            .ok_or(UserError::NotFound(old_id))?;

        let txn = self.db.begin().await?;

        let migrated = users::ActiveModel {
            id: Set(new_id),
            display_name: Set(old.display_name.clone()),
            email: Set(old.email.clone()),
            code: Set(old.code.clone()),
            role: Set(old.role.clone()),
            balance: Set(old.balance),
            is_active: Set(old.is_active),
            created_at: Set(old.created_at),
            updated_at: Set(Utc::now().into()),
        };

        // The old row must go before the copy lands, or the unique email
        // constraint rejects the insert.
        users::Entity::delete_by_id(old_id).exec(&txn).await?;
        let migrated = migrated.insert(&txn).await?;

        expenses::Entity::update_many()
            .col_expr(expenses::Column::UserId, Expr::val(new_id).into())
            .filter(expenses::Column::UserId.eq(old_id))
            .exec(&txn)
            .await?;
        allocations::Entity::update_many()
            .col_expr(allocations::Column::UserId, Expr::val(new_id).into())
            .filter(allocations::Column::UserId.eq(old_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        warn!(
            %old_id,
            %new_id,
            balance = %migrated.balance,
            "account migrated with balance copied verbatim; run the repair job to verify"
        );
        Ok(migrated)
    }
}
