//! Per-project criterion scores and composite scoring.

mod composite;
mod engine;
mod error;
mod types;
mod workflow;

#[cfg(test)]
mod composite_props;
#[cfg(test)]
mod engine_tests;

pub use composite::CompositeCalculator;
pub use engine::{MAX_SCORE, ScoreRepository, ScoringEngine};
pub use error::ScoringError;
pub use types::{
    CompositeScore, CriterionContribution, ProjectScore, ScoreCommit, ScoreInput, ScoreStatus,
    ScoringProgress,
};
pub use workflow::ScoreWorkflow;
