//! Budget error types.

use keystone_shared::AppError;
use keystone_shared::types::{AllocationId, BudgetCycleId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{AllocationStatus, CycleStatus};
use crate::error::ErrorKind;
use crate::store::StoreError;

/// Budget allocation errors.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Input failed validation.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// Reason.
        message: String,
    },

    /// Budget cycle not found.
    #[error("budget cycle not found: {0}")]
    CycleNotFound(BudgetCycleId),

    /// Allocation not found.
    #[error("allocation not found: {0}")]
    AllocationNotFound(AllocationId),

    /// Year outside the cycle.
    #[error("year {year} is outside the cycle ({start_year}-{end_year})")]
    YearOutOfRange {
        /// Requested year.
        year: i32,
        /// First cycle year.
        start_year: i32,
        /// Last cycle year.
        end_year: i32,
    },

    /// Cycle status transition not permitted.
    #[error("invalid cycle status transition from {from} to {to}")]
    InvalidCycleTransition {
        /// Current status.
        from: CycleStatus,
        /// Requested status.
        to: CycleStatus,
    },

    /// Allocation status transition not permitted.
    #[error("invalid allocation status transition from {from} to {to}")]
    InvalidAllocationTransition {
        /// Current status.
        from: AllocationStatus,
        /// Requested status.
        to: AllocationStatus,
    },

    /// The cycle no longer accepts allocation changes.
    #[error("budget cycle {id} is {status} and accepts no allocation changes")]
    CycleClosed {
        /// Cycle.
        id: BudgetCycleId,
        /// Current status.
        status: CycleStatus,
    },

    /// The change would leave allocations outside the cycle years.
    #[error("{count} allocation(s) would fall outside {start_year}-{end_year}")]
    StrandedAllocations {
        /// Allocations affected.
        count: usize,
        /// New first year.
        start_year: i32,
        /// New last year.
        end_year: i32,
    },

    /// A year's allocations would exceed its funding constraint.
    #[error("allocations for {year} would total {total}, above the funding constraint of {constraint}")]
    FundingConstraintExceeded {
        /// Year.
        year: i32,
        /// Cap.
        constraint: Decimal,
        /// Resulting total.
        total: Decimal,
    },

    /// A money total left the representable decimal range.
    #[error("{0} is too large to represent")]
    Overflow(&'static str),

    /// Caller lacks the role for the action.
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BudgetError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. }
            | Self::YearOutOfRange { .. }
            | Self::InvalidCycleTransition { .. }
            | Self::InvalidAllocationTransition { .. }
            | Self::CycleClosed { .. }
            | Self::StrandedAllocations { .. }
            | Self::Overflow(_) => ErrorKind::Validation,
            Self::CycleNotFound(_) | Self::AllocationNotFound(_) => ErrorKind::NotFound,
            Self::FundingConstraintExceeded { .. } => ErrorKind::Consistency,
            Self::PermissionDenied(_) => ErrorKind::Permission,
            Self::Store(err) => ErrorKind::of_store(err),
        }
    }
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::Validation { field, message } => Self::validation(field, message),
            BudgetError::YearOutOfRange { .. } => Self::validation("year", err.to_string()),
            BudgetError::InvalidCycleTransition { .. }
            | BudgetError::InvalidAllocationTransition { .. }
            | BudgetError::CycleClosed { .. } => Self::validation("status", err.to_string()),
            BudgetError::StrandedAllocations { .. } => {
                Self::validation("duration_years", err.to_string())
            }
            BudgetError::Overflow(_) => Self::validation("amount", err.to_string()),
            BudgetError::CycleNotFound(id) => Self::not_found("budget cycle", id),
            BudgetError::AllocationNotFound(id) => Self::not_found("allocation", id),
            BudgetError::FundingConstraintExceeded { .. } => Self::Consistency(err.to_string()),
            BudgetError::PermissionDenied(_) => Self::Forbidden(err.to_string()),
            BudgetError::Store(store) => store.into(),
        }
    }
}
