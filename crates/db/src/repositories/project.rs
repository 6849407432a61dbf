//! Project repository: CRUD, soft deletion and read-side breakdowns.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use viatix_core::ledger::aggregate::{self, Breakdown};
use viatix_shared::types::ProjectId;

use crate::entities::{
    allocations, expenses, projects,
    sea_orm_active_enums::{ProjectKind as DbProjectKind, ProjectStatus as DbProjectStatus},
};
use crate::repositories::{allocation_record, expense_record};

/// Error types for project operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// Project not found.
    #[error("Project not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a project.
#[derive(Debug, Clone)]
pub struct CreateProjectInput {
    /// Project name.
    pub name: String,
    /// Client the project is billed to.
    pub client: Option<String>,
    /// Optional short code.
    pub code: Option<String>,
    /// Optional recurrence tag.
    pub recurrence: Option<String>,
    /// Kind (client-billable or petty cash).
    pub kind: DbProjectKind,
}

/// Project repository.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    db: DatabaseConnection,
}

impl ProjectRepository {
    /// Creates a new project repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a project with a zero spend cache.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn create(&self, input: CreateProjectInput) -> Result<projects::Model, ProjectError> {
        let now = Utc::now().into();
        let model = projects::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name),
            client: Set(input.client),
            code: Set(input.code),
            recurrence: Set(input.recurrence),
            kind: Set(input.kind),
            status: Set(DbProjectStatus::Active),
            expenses: Set(rust_decimal::Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(&self.db).await?)
    }

    /// Finds a project by id.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn find_by_id(
        &self,
        project_id: Uuid,
    ) -> Result<Option<projects::Model>, ProjectError> {
        Ok(projects::Entity::find_by_id(project_id).one(&self.db).await?)
    }

    /// Lists active projects ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_active(&self) -> Result<Vec<projects::Model>, ProjectError> {
        Ok(projects::Entity::find()
            .filter(projects::Column::Status.eq(DbProjectStatus::Active))
            .order_by_asc(projects::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Soft-deletes a project. The row stays behind so historical expenses
    /// and allocations keep their references.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn soft_delete(&self, project_id: Uuid) -> Result<projects::Model, ProjectError> {
        let model = self
            .find_by_id(project_id)
            .await?
            .ok_or(ProjectError::NotFound(project_id))?;

        let mut active: projects::ActiveModel = model.into();
        active.status = Set(DbProjectStatus::Deleted);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Read-side breakdown `{assigned, justified, spent, rejected}` for a
    /// project, recomputed from the raw streams on every call. Used by the
    /// detail view and as a drift check against the cached spend total.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn breakdown(&self, project_id: Uuid) -> Result<Breakdown, ProjectError> {
        let allocation_models = allocations::Entity::find()
            .filter(allocations::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?;
        let expense_models = expenses::Entity::find()
            .filter(expenses::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?;

        let allocation_records: Vec<_> =
            allocation_models.iter().map(allocation_record).collect();
        let expense_records: Vec<_> = expense_models.iter().map(expense_record).collect();

        Ok(aggregate::project_breakdown(
            ProjectId::from_uuid(project_id),
            &allocation_records,
            &expense_records,
        ))
    }
}
