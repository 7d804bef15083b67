//! Error classification shared by every module error.

use serde::Serialize;

/// Coarse category of a module error, independent of the module it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input; the caller can fix it.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The actor's role does not allow the action.
    Permission,
    /// A cross-entity rule would be broken.
    Consistency,
    /// A concurrent writer won and retries ran out.
    Conflict,
    /// The store is unreachable.
    Unavailable,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Classifies a store failure.
    #[must_use]
    pub const fn of_store(err: &crate::StoreError) -> Self {
        match err {
            crate::StoreError::Unavailable(_) => Self::Unavailable,
            crate::StoreError::Conflict => Self::Conflict,
            crate::StoreError::Backend(_) => Self::Internal,
        }
    }
}
