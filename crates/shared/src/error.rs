//! Application-wide error taxonomy.
//!
//! Every module error in `keystone-core` converts into [`AppError`], which is
//! what the request-handling tier renders.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation. Names the offending field.
    #[error("Validation error on {field}: {message}")]
    Validation {
        /// Offending field.
        field: String,
        /// Human readable reason.
        message: String,
    },

    /// Referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "criterion".
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Caller lacks the role required for the action.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// A cross-entity rule would be broken (weight sum, funding constraint).
    #[error("Consistency violation: {0}")]
    Consistency(String),

    /// Concurrent modification lost the race and retries were exhausted.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The data store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a validation error for a named field.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Builds a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the HTTP status code the calling tier should use.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            Self::Consistency(_) => 422,
            Self::StoreUnavailable(_) => 503,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Forbidden(_) => "PERMISSION_DENIED",
            Self::Consistency(_) => "CONSISTENCY_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
