//! Criteria error types.

use keystone_shared::AppError;
use keystone_shared::types::CriterionId;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::CriterionLifecycle;
use crate::error::ErrorKind;
use crate::store::StoreError;

/// Criteria registry errors.
#[derive(Debug, Error)]
pub enum CriteriaError {
    /// Input failed validation.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// Reason.
        message: String,
    },

    /// Another active criterion already uses the name.
    #[error("an active criterion named '{0}' already exists")]
    DuplicateName(String),

    /// Criterion not found.
    #[error("criterion not found: {0}")]
    NotFound(CriterionId),

    /// The operation does not apply to the criterion's lifecycle state.
    #[error("cannot {action} criterion {id} while it is {lifecycle}")]
    InvalidLifecycle {
        /// Criterion.
        id: CriterionId,
        /// Current lifecycle.
        lifecycle: CriterionLifecycle,
        /// Attempted action.
        action: &'static str,
    },

    /// Confirmation token did not match the criterion name.
    #[error("confirmation does not match the criterion name")]
    ConfirmationMismatch,

    /// Caller lacks the role for the action.
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),

    /// Active weights do not sum to 100 after normalization.
    #[error("active criteria weights sum to {total}, expected 100")]
    WeightInvariant {
        /// Observed sum.
        total: Decimal,
    },

    /// Every retry lost against a concurrent criteria writer.
    #[error("criteria changed concurrently; gave up after {attempts} attempts")]
    ConcurrentModification {
        /// Attempts made.
        attempts: u32,
    },

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CriteriaError {
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
            | Self::DuplicateName(_)
            | Self::InvalidLifecycle { .. }
            | Self::ConfirmationMismatch => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PermissionDenied(_) => ErrorKind::Permission,
            Self::WeightInvariant { .. } => ErrorKind::Consistency,
            Self::ConcurrentModification { .. } => ErrorKind::Conflict,
            Self::Store(err) => ErrorKind::of_store(err),
        }
    }
}

impl From<CriteriaError> for AppError {
    fn from(err: CriteriaError) -> Self {
        match err {
            CriteriaError::Validation { field, message } => Self::validation(field, message),
            CriteriaError::DuplicateName(_) => Self::validation("name", err.to_string()),
            CriteriaError::InvalidLifecycle { .. } => Self::validation("lifecycle", err.to_string()),
            CriteriaError::ConfirmationMismatch => {
                Self::validation("confirmation", err.to_string())
            }
            CriteriaError::NotFound(id) => Self::not_found("criterion", id),
            CriteriaError::PermissionDenied(_) => Self::Forbidden(err.to_string()),
            CriteriaError::WeightInvariant { .. } => Self::Consistency(err.to_string()),
            CriteriaError::ConcurrentModification { .. } => Self::Conflict(err.to_string()),
            CriteriaError::Store(store) => store.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            StoreError::Conflict => Self::Conflict(err.to_string()),
            StoreError::Backend(msg) => Self::Database(msg),
        }
    }
}
