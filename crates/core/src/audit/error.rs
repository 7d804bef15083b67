//! Audit query errors.

use keystone_shared::AppError;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::store::StoreError;

/// Audit trail errors.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Feed limit must be positive.
    #[error("limit must be positive, got {0}")]
    InvalidLimit(u64),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuditError {
    /// Error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLimit(_) => ErrorKind::Validation,
            Self::Store(err) => ErrorKind::of_store(err),
        }
    }
}

impl From<AuditError> for AppError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::InvalidLimit(_) => Self::validation("limit", err.to_string()),
            AuditError::Store(store) => store.into(),
        }
    }
}
