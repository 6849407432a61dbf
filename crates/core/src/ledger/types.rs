//! Ledger domain types.
//!
//! These are plain in-memory records, decoupled from any storage layer. The
//! repositories in `viatix-db` map their entities into these types before
//! handing them to the ledger engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use viatix_shared::types::{
    AllocationId, Currency, ExpenseId, InvoiceId, Money, ProjectId, SplitGroupId, UserId,
};

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Can approve, reject, allocate, invoice and repair.
    Admin,
    /// Can submit expenses and view their own balance.
    Professional,
}

impl UserRole {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "professional" => Some(Self::Professional),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Professional => "professional",
        }
    }
}

/// Expense status in the review workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Submitted, awaiting an administrator decision.
    Pending,
    /// Accepted; charged against the project's spend total.
    Approved,
    /// Refused; no longer counts toward any balance.
    Rejected,
}

impl ExpenseStatus {
    /// Returns true if an expense in this status is credited to its owner's
    /// balance (pending and approved both count; only rejection reverses).
    #[must_use]
    pub fn counts_toward_balance(self) -> bool {
        !matches!(self, Self::Rejected)
    }

    /// Returns true if an expense in this status is charged against the
    /// project spend cache (approved only).
    #[must_use]
    pub fn charges_project(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Kind of allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationKind {
    /// A normal viatico grant (positive amount).
    Grant,
    /// Source side of a project-to-project transfer (negative amount).
    TransferOut,
    /// Destination side of a project-to-project transfer (positive amount).
    TransferIn,
}

/// Kind of project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    /// Ordinary client-billable cost center.
    Client,
    /// Shared discretionary fund ("caja chica").
    PettyCash,
}

/// A user account with its cached balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Account identifier.
    pub id: UserId,
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Role.
    pub role: UserRole,
    /// Cached net balance. See `balance` module for the sign convention.
    pub balance: Decimal,
}

/// A project (cost center) with its cached approved-spend total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Project identifier.
    pub id: ProjectId,
    /// Project name.
    pub name: String,
    /// Client the project is billed to.
    pub client: Option<String>,
    /// Optional short code.
    pub code: Option<String>,
    /// Kind (client-billable or petty cash).
    pub kind: ProjectKind,
    /// Cached total of approved expense amounts charged to this project.
    pub expenses: Decimal,
}

/// An allocation (viatico grant or transfer leg).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// Allocation identifier.
    pub id: AllocationId,
    /// User the funds were given to.
    pub user_id: UserId,
    /// Project the funds were assigned against.
    pub project_id: ProjectId,
    /// Signed amount. Grants are positive; transfer-out legs are negative.
    pub amount: Decimal,
    /// Date of the grant.
    pub date: NaiveDate,
    /// Kind of allocation.
    pub kind: AllocationKind,
}

/// An expense (rendicion) record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Expense identifier.
    pub id: ExpenseId,
    /// Owning user. `None` survives a dangling reference left behind by an
    /// account migration; such rows never reach any balance.
    pub user_id: Option<UserId>,
    /// True when the expense is charged directly to a project with no
    /// individual owner; excluded from every user balance.
    pub is_company_expense: bool,
    /// Project charged. `None` groups under the unassigned bucket.
    pub project_id: Option<ProjectId>,
    /// Event the expense was incurred for.
    pub event_name: Option<String>,
    /// Expense category.
    pub category: Option<String>,
    /// Date of the expense.
    pub date: NaiveDate,
    /// Vendor name.
    pub merchant: Option<String>,
    /// Amount claimed (non-negative).
    pub amount: Decimal,
    /// Currency of the claim.
    pub currency: Currency,
    /// Review status.
    pub status: ExpenseStatus,
    /// Reason given on rejection.
    pub rejection_reason: Option<String>,
    /// URL of the stored receipt image, if any.
    pub receipt_url: Option<String>,
    /// Set while the expense is referenced by a non-annulled invoice.
    pub invoice_id: Option<InvoiceId>,
    /// Links sibling rows created from one split submission.
    pub split_group_id: Option<SplitGroupId>,
}

impl ExpenseRecord {
    /// Returns true if the expense is frozen by a pre-invoice.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.invoice_id.is_some()
    }

    /// The claimed amount with its currency.
    #[must_use]
    pub fn money(&self) -> Money {
        Money::new(self.amount, self.currency)
    }
}

/// One row of a submission: a project bucket and the amount charged to it.
///
/// A plain (non-split) submission is a single row carrying the full amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRow {
    /// Project charged by this row, if any.
    pub project_id: Option<ProjectId>,
    /// Amount charged by this row (must be positive).
    pub amount: Decimal,
}

/// Input for submitting an expense, possibly split across projects.
#[derive(Debug, Clone)]
pub struct SubmitExpenseInput {
    /// Owning user. Ignored for company expenses.
    pub user_id: Option<UserId>,
    /// True for expenses charged directly to projects with no owner.
    pub is_company_expense: bool,
    /// Total amount declared by the submitter.
    pub declared_total: Decimal,
    /// Currency of the claim.
    pub currency: Currency,
    /// Date of the expense.
    pub date: NaiveDate,
    /// Event the expense was incurred for.
    pub event_name: Option<String>,
    /// Expense category.
    pub category: Option<String>,
    /// Vendor name.
    pub merchant: Option<String>,
    /// URL of the stored receipt image, if any.
    pub receipt_url: Option<String>,
    /// One row per charged project; a single row for a plain submission.
    pub rows: Vec<SplitRow>,
}
