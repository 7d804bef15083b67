//! Ranking cache and what-if weighting scenarios.

mod error;
mod rank;
mod service;
mod types;

#[cfg(test)]
mod tests;

pub use error::RankingError;
pub use rank::RankAssigner;
pub use service::{RankingRepository, RankingService};
pub use types::{
    RankingEntry, RankingMetadata, RankingQuery, RankingSnapshot, ScenarioComparison,
    ScenarioResult, ScoringStatus, WeightScenario,
};
