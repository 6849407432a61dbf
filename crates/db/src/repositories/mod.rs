//! Repository abstractions for data access.
//!
//! Every balance-affecting repository method asks `LedgerService` for a
//! mutation plan and executes it inside one database transaction: the record
//! write and the cache increments land together or not at all. Cache
//! increments are relative (`balance = balance + delta`), so concurrent
//! deltas compose the way the store's atomic counters would.

pub mod allocation;
pub mod expense;
pub mod invoice;
pub mod project;
pub mod repair;
pub mod user;

pub use allocation::AllocationRepository;
pub use expense::ExpenseRepository;
pub use invoice::InvoiceRepository;
pub use project::ProjectRepository;
pub use repair::RepairRepository;
pub use user::UserRepository;

use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter};
use tracing::warn;
use uuid::Uuid;

use viatix_core::ledger::types::{
    AllocationKind, AllocationRecord, ExpenseRecord, ExpenseStatus, ProjectKind, ProjectRecord,
    UserRecord, UserRole,
};
use viatix_shared::types::{
    AllocationId, ExpenseId, InvoiceId, ProjectId, SplitGroupId, UserId,
};

use crate::entities::{allocations, expenses, projects, sea_orm_active_enums as db_enums, users};

/// Applies a relative balance increment to a user inside the transaction.
///
/// A missing user is the documented degraded path: the record write goes
/// ahead, the balance write is skipped, and the inconsistency is logged for
/// the repair job to reconcile.
pub(crate) async fn apply_user_delta(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    delta: Decimal,
) -> Result<(), DbErr> {
    if delta.is_zero() {
        return Ok(());
    }

    let result = users::Entity::update_many()
        .col_expr(
            users::Column::Balance,
            Expr::col(users::Column::Balance).add(Expr::val(delta)),
        )
        .col_expr(users::Column::UpdatedAt, Expr::current_timestamp().into())
        .filter(users::Column::Id.eq(user_id))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        warn!(%user_id, %delta, "user not found, skipping balance update");
    }
    Ok(())
}

/// Applies a relative increment to a project's approved-spend cache inside
/// the transaction. Missing projects degrade the same way missing users do.
pub(crate) async fn apply_project_delta(
    txn: &DatabaseTransaction,
    project_id: Uuid,
    delta: Decimal,
) -> Result<(), DbErr> {
    if delta.is_zero() {
        return Ok(());
    }

    let result = projects::Entity::update_many()
        .col_expr(
            projects::Column::Expenses,
            Expr::col(projects::Column::Expenses).add(Expr::val(delta)),
        )
        .col_expr(projects::Column::UpdatedAt, Expr::current_timestamp().into())
        .filter(projects::Column::Id.eq(project_id))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        warn!(%project_id, %delta, "project not found, skipping spend update");
    }
    Ok(())
}

// ============================================================
// Entity -> ledger record mapping
// ============================================================

pub(crate) fn user_record(model: &users::Model) -> UserRecord {
    UserRecord {
        id: UserId::from_uuid(model.id),
        display_name: model.display_name.clone(),
        email: model.email.clone(),
        role: match model.role {
            db_enums::UserRole::Admin => UserRole::Admin,
            db_enums::UserRole::Professional => UserRole::Professional,
        },
        balance: model.balance,
    }
}

pub(crate) fn project_record(model: &projects::Model) -> ProjectRecord {
    ProjectRecord {
        id: ProjectId::from_uuid(model.id),
        name: model.name.clone(),
        client: model.client.clone(),
        code: model.code.clone(),
        kind: match model.kind {
            db_enums::ProjectKind::Client => ProjectKind::Client,
            db_enums::ProjectKind::PettyCash => ProjectKind::PettyCash,
        },
        expenses: model.expenses,
    }
}

pub(crate) fn allocation_record(model: &allocations::Model) -> AllocationRecord {
    AllocationRecord {
        id: AllocationId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        project_id: ProjectId::from_uuid(model.project_id),
        amount: model.amount,
        date: model.date,
        kind: match model.kind {
            db_enums::AllocationKind::Grant => AllocationKind::Grant,
            db_enums::AllocationKind::TransferOut => AllocationKind::TransferOut,
            db_enums::AllocationKind::TransferIn => AllocationKind::TransferIn,
        },
    }
}

pub(crate) fn expense_record(model: &expenses::Model) -> ExpenseRecord {
    ExpenseRecord {
        id: ExpenseId::from_uuid(model.id),
        user_id: model.user_id.map(UserId::from_uuid),
        is_company_expense: model.is_company_expense,
        project_id: model.project_id.map(ProjectId::from_uuid),
        event_name: model.event_name.clone(),
        category: model.category.clone(),
        date: model.date,
        merchant: model.merchant.clone(),
        amount: model.amount,
        currency: model.currency.parse().unwrap_or_default(),
        status: expense_status_from_db(&model.status),
        rejection_reason: model.rejection_reason.clone(),
        receipt_url: model.receipt_url.clone(),
        invoice_id: model.invoice_id.map(InvoiceId::from_uuid),
        split_group_id: model.split_group_id.map(SplitGroupId::from_uuid),
    }
}

pub(crate) fn expense_status_from_db(status: &db_enums::ExpenseStatus) -> ExpenseStatus {
    match status {
        db_enums::ExpenseStatus::Pending => ExpenseStatus::Pending,
        db_enums::ExpenseStatus::Approved => ExpenseStatus::Approved,
        db_enums::ExpenseStatus::Rejected => ExpenseStatus::Rejected,
    }
}

pub(crate) fn expense_status_to_db(status: ExpenseStatus) -> db_enums::ExpenseStatus {
    match status {
        ExpenseStatus::Pending => db_enums::ExpenseStatus::Pending,
        ExpenseStatus::Approved => db_enums::ExpenseStatus::Approved,
        ExpenseStatus::Rejected => db_enums::ExpenseStatus::Rejected,
    }
}

pub(crate) fn allocation_kind_to_db(kind: AllocationKind) -> db_enums::AllocationKind {
    match kind {
        AllocationKind::Grant => db_enums::AllocationKind::Grant,
        AllocationKind::TransferOut => db_enums::AllocationKind::TransferOut,
        AllocationKind::TransferIn => db_enums::AllocationKind::TransferIn,
    }
}
