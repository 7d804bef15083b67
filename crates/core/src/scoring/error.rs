//! Scoring error types.

use keystone_shared::AppError;
use keystone_shared::types::{CriterionId, ProjectId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::ScoreStatus;
use crate::error::ErrorKind;
use crate::store::StoreError;

/// Scoring engine errors.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Score outside 0–10.
    #[error("score {score} for criterion {criteria_id} is outside 0-10")]
    ScoreOutOfRange {
        /// Criterion.
        criteria_id: CriterionId,
        /// Rejected score.
        score: Decimal,
    },

    /// Criterion is unknown or not active.
    #[error("criterion {0} is not an active criterion")]
    InactiveCriterion(CriterionId),

    /// The same criterion appears twice in one request.
    #[error("criterion {0} is scored more than once in the request")]
    DuplicateCriterion(CriterionId),

    /// No score exists for the pair.
    #[error("no score for project {project_id} on criterion {criteria_id}")]
    ScoreNotFound {
        /// Project.
        project_id: ProjectId,
        /// Criterion.
        criteria_id: CriterionId,
    },

    /// Locked scores cannot be edited.
    #[error("score for criterion {0} is locked")]
    Locked(CriterionId),

    /// Status transition not permitted.
    #[error("invalid score status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: ScoreStatus,
        /// Requested status.
        to: ScoreStatus,
    },

    /// Caller lacks the role for the action.
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScoringError {
    /// Error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ScoreOutOfRange { .. }
            | Self::InactiveCriterion(_)
            | Self::DuplicateCriterion(_)
            | Self::Locked(_)
            | Self::InvalidTransition { .. } => ErrorKind::Validation,
            Self::ScoreNotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied(_) => ErrorKind::Permission,
            Self::Store(err) => ErrorKind::of_store(err),
        }
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::ScoreOutOfRange { .. } => Self::validation("score", err.to_string()),
            ScoringError::InactiveCriterion(_) | ScoringError::DuplicateCriterion(_) => {
                Self::validation("criteria_id", err.to_string())
            }
            ScoringError::Locked(_) | ScoringError::InvalidTransition { .. } => {
                Self::validation("status", err.to_string())
            }
            ScoringError::ScoreNotFound {
                project_id,
                criteria_id,
            } => Self::not_found("project score", format!("{project_id}/{criteria_id}")),
            ScoringError::PermissionDenied(_) => Self::Forbidden(err.to_string()),
            ScoringError::Store(store) => store.into(),
        }
    }
}
