//! Ranking error types.

use keystone_shared::AppError;
use keystone_shared::types::CriterionId;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::store::StoreError;

/// Ranking service errors.
#[derive(Debug, Error)]
pub enum RankingError {
    /// Scenario weight outside 0–100.
    #[error("scenario '{scenario}' gives criterion {criteria_id} weight {weight}, outside 0-100")]
    InvalidScenarioWeight {
        /// Scenario label.
        scenario: String,
        /// Criterion.
        criteria_id: CriterionId,
        /// Rejected weight.
        weight: Decimal,
    },

    /// Scenario references a criterion that is not active.
    #[error("scenario '{scenario}' references criterion {criteria_id}, which is not active")]
    UnknownCriterion {
        /// Scenario label.
        scenario: String,
        /// Criterion.
        criteria_id: CriterionId,
    },

    /// Score bounds are inverted.
    #[error("min_score {min} is greater than max_score {max}")]
    InvalidBounds {
        /// Lower bound.
        min: Decimal,
        /// Upper bound.
        max: Decimal,
    },

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RankingError {
    /// Error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidScenarioWeight { .. }
            | Self::UnknownCriterion { .. }
            | Self::InvalidBounds { .. } => ErrorKind::Validation,
            Self::Store(err) => ErrorKind::of_store(err),
        }
    }
}

impl From<RankingError> for AppError {
    fn from(err: RankingError) -> Self {
        match err {
            RankingError::InvalidScenarioWeight { .. } | RankingError::UnknownCriterion { .. } => {
                Self::validation("scenarios", err.to_string())
            }
            RankingError::InvalidBounds { .. } => Self::validation("min_score", err.to_string()),
            RankingError::Store(store) => store.into(),
        }
    }
}
