//! The balance-effect transition table.
//!
//! Every mutating event in the system maps to exactly one `(user delta,
//! project delta)` pair. The original behavior spread these deltas across
//! every screen that could touch an expense; here they are computed in one
//! place so a caller can never apply half of an inverse.
//!
//! Signs follow the convention documented in [`super::balance`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::ExpenseStatus;

/// An administrator's review decision on a pending or approved expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewEvent {
    /// Accept the expense.
    Approve,
    /// Refuse the expense.
    Reject,
}

impl std::fmt::Display for ReviewEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// The pair of cache deltas an event applies atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEffect {
    /// Delta applied to the owning user's cached balance.
    pub user: Decimal,
    /// Delta applied to the charged project's cached spend total.
    /// Only applied when the expense actually references a project.
    pub project: Decimal,
}

impl BalanceEffect {
    /// The no-op effect.
    pub const NONE: Self = Self {
        user: Decimal::ZERO,
        project: Decimal::ZERO,
    };

    /// Returns true if neither cache moves.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.user.is_zero() && self.project.is_zero()
    }
}

/// Effect of submitting an expense.
///
/// Submission credits the owner immediately, regardless of status: the
/// balance reflects "amount outstanding to be justified or reimbursed" from
/// the moment of submission. Company expenses never touch a user balance.
/// The project spend cache moves only on approval, never on submission.
#[must_use]
pub fn submission_effect(amount: Decimal, is_company: bool) -> BalanceEffect {
    BalanceEffect {
        user: if is_company { Decimal::ZERO } else { amount },
        project: Decimal::ZERO,
    }
}

/// Effect of an administrator review decision, branching on the expense's
/// *current* status. Returns the status after the event together with the
/// deltas that entry applies.
///
/// # Errors
///
/// Returns `LedgerError::InvalidTransition` when the event is not legal from
/// the current status (approving twice, rejecting a rejection, and so on).
pub fn review_effect(
    current: ExpenseStatus,
    event: ReviewEvent,
    amount: Decimal,
    is_company: bool,
) -> Result<(ExpenseStatus, BalanceEffect), LedgerError> {
    let user_reversal = if is_company { Decimal::ZERO } else { -amount };

    match (current, event) {
        // The owner was already credited on submission; approval only
        // charges the project.
        (ExpenseStatus::Pending, ReviewEvent::Approve) => Ok((
            ExpenseStatus::Approved,
            BalanceEffect {
                user: Decimal::ZERO,
                project: amount,
            },
        )),
        (ExpenseStatus::Pending, ReviewEvent::Reject) => Ok((
            ExpenseStatus::Rejected,
            BalanceEffect {
                user: user_reversal,
                project: Decimal::ZERO,
            },
        )),
        // Rejecting a previously approved expense must also back the amount
        // out of the project spend cache.
        (ExpenseStatus::Approved, ReviewEvent::Reject) => Ok((
            ExpenseStatus::Rejected,
            BalanceEffect {
                user: user_reversal,
                project: -amount,
            },
        )),
        (from, event) => Err(LedgerError::InvalidTransition { from, event }),
    }
}

/// Effect of hard-deleting an expense: the exact inverse of everything the
/// expense's current status ever applied.
#[must_use]
pub fn deletion_effect(current: ExpenseStatus, amount: Decimal, is_company: bool) -> BalanceEffect {
    let user_reversal = if is_company { Decimal::ZERO } else { -amount };

    match current {
        ExpenseStatus::Pending => BalanceEffect {
            user: user_reversal,
            project: Decimal::ZERO,
        },
        ExpenseStatus::Approved => BalanceEffect {
            user: user_reversal,
            project: -amount,
        },
        // A rejected expense was already fully reversed.
        ExpenseStatus::Rejected => BalanceEffect::NONE,
    }
}

/// User-balance delta of creating an allocation of `amount`.
#[must_use]
pub fn allocation_created(amount: Decimal) -> Decimal {
    -amount
}

/// User-balance delta of deleting an allocation of `amount`.
#[must_use]
pub fn allocation_deleted(amount: Decimal) -> Decimal {
    amount
}

/// User-balance delta of amending an allocation from `old` to `new` on the
/// same user: the delta-of-deltas.
#[must_use]
pub fn allocation_amended(old: Decimal, new: Decimal) -> Decimal {
    -(new - old)
}
