//! Database enum mappings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a user account.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Can approve, reject, allocate, invoice and repair.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Can submit expenses and view their own balance.
    #[sea_orm(string_value = "professional")]
    Professional,
}

/// Review status of an expense.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_status")]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Awaiting an administrator decision.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted and charged to the project.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Refused.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Kind of allocation.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "allocation_kind")]
#[serde(rename_all = "snake_case")]
pub enum AllocationKind {
    /// Normal viatico grant.
    #[sea_orm(string_value = "grant")]
    Grant,
    /// Source leg of a transfer.
    #[sea_orm(string_value = "transfer_out")]
    TransferOut,
    /// Destination leg of a transfer.
    #[sea_orm(string_value = "transfer_in")]
    TransferIn,
}

/// Kind of project.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "project_kind")]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    /// Ordinary client-billable cost center.
    #[sea_orm(string_value = "client")]
    Client,
    /// Shared discretionary fund ("caja chica").
    #[sea_orm(string_value = "petty_cash")]
    PettyCash,
}

/// Lifecycle status of a project. Projects are soft-deleted to preserve
/// referential integrity for historical records.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "project_status")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// In use.
    #[sea_orm(string_value = "active")]
    Active,
    /// Soft-deleted.
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

/// Payment status of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Issued, awaiting payment.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled against a bank movement.
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Cancelled; member expenses released.
    #[sea_orm(string_value = "annulled")]
    Annulled,
}
