//! Environmental scoring errors.

use keystone_shared::AppError;
use thiserror::Error;

use crate::criteria::CriteriaError;
use crate::error::ErrorKind;
use crate::scoring::ScoringError;
use crate::store::StoreError;

/// Errors raised while scoring environmental impact.
#[derive(Debug, Error)]
pub enum EnvironmentalError {
    /// Provisioning the environmental criterion failed.
    #[error(transparent)]
    Criteria(#[from] CriteriaError),

    /// Writing the score failed.
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// Reading green upgrades failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EnvironmentalError {
    /// Error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Criteria(err) => err.kind(),
            Self::Scoring(err) => err.kind(),
            Self::Store(err) => ErrorKind::of_store(err),
        }
    }
}

impl From<EnvironmentalError> for AppError {
    fn from(err: EnvironmentalError) -> Self {
        match err {
            EnvironmentalError::Criteria(err) => err.into(),
            EnvironmentalError::Scoring(err) => err.into(),
            EnvironmentalError::Store(err) => err.into(),
        }
    }
}
