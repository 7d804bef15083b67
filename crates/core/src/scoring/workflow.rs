//! Score status workflow.
//!
//! Scores advance one step at a time: draft → submitted → locked. There is
//! no way back.

use keystone_shared::types::CriterionId;

use super::error::ScoringError;
use super::types::ScoreStatus;

/// Stateless validator for score status transitions.
pub struct ScoreWorkflow;

impl ScoreWorkflow {
    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: ScoreStatus, to: ScoreStatus) -> bool {
        from.next() == Some(to)
    }

    /// Validates a transition.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError::InvalidTransition` unless `to` is the next status after `from`.
    pub fn transition(from: ScoreStatus, to: ScoreStatus) -> Result<ScoreStatus, ScoringError> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(ScoringError::InvalidTransition { from, to })
        }
    }

    /// Status a rescored row keeps. New rows start as draft.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError::Locked` for a locked row.
    pub fn status_after_rescore(
        existing: Option<ScoreStatus>,
        criteria_id: CriterionId,
    ) -> Result<ScoreStatus, ScoringError> {
        match existing {
            None => Ok(ScoreStatus::Draft),
            Some(ScoreStatus::Locked) => Err(ScoringError::Locked(criteria_id)),
            Some(status) => Ok(status),
        }
    }
}
