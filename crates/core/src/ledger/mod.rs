//! Ledger engine: balances, the mutation protocol, aggregation and repair.
//!
//! This module implements the core ledger functionality:
//! - Record types for users, projects, allocations and expenses
//! - The balance formulas relating raw records to derived totals
//! - The balance-effect transition table for every mutating event
//! - The ledger service that turns inputs into atomic mutation plans
//! - Read-side aggregation of per-project totals
//! - Full-history balance recomputation (repair)
//! - The invoice lock boundary

pub mod aggregate;
pub mod balance;
pub mod effect;
pub mod error;
pub mod invoice;
pub mod repair;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod repair_props;
#[cfg(test)]
mod service_props;

pub use aggregate::{Breakdown, breakdown_by_project, project_breakdown, user_breakdown};
pub use balance::{balance, project_assigned, project_spent, total_allocated, total_justified};
pub use effect::{BalanceEffect, ReviewEvent, deletion_effect, review_effect, submission_effect};
pub use error::LedgerError;
pub use invoice::{InvoiceRecord, InvoiceStatus, ensure_unlocked};
pub use repair::{ProjectCorrection, UserCorrection, recompute_project_totals, recompute_user_balances};
pub use service::LedgerService;
pub use types::{
    AllocationKind, AllocationRecord, ExpenseRecord, ExpenseStatus, ProjectKind, ProjectRecord,
    SplitRow, SubmitExpenseInput, UserRecord, UserRole,
};
