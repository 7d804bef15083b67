//! Environmental impact scoring from green upgrade records.

mod curve;
mod error;
mod scorer;
mod types;

#[cfg(test)]
mod tests;

pub use curve::{criterion_score, environmental_score};
pub use error::EnvironmentalError;
pub use scorer::{EnvironmentalImpactScorer, GreenUpgradeSource};
pub use types::{AutoScoreResult, EnvironmentalImpact, GreenUpgrade, GreenUpgradeStatus};
