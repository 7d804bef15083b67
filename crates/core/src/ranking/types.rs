//! Ranking cache and what-if scenario types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use keystone_shared::types::{CriterionId, ProjectId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::DataRevision;

/// One cached ranking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// Project.
    pub project_id: ProjectId,
    /// Composite score, 0–100.
    pub composite_score: Decimal,
    /// 1-based rank, unique within a snapshot.
    pub rank: u32,
    /// Number of weighted criteria the project had scores for.
    pub scored_criteria: u32,
}

/// A complete ranking computed at one data revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingSnapshot {
    /// Entries in rank order.
    pub entries: Vec<RankingEntry>,
    /// Revision of the criteria and scores the ranking was computed from.
    pub revision: DataRevision,
    /// When the ranking was computed.
    pub calculated_at: DateTime<Utc>,
}

/// What the store knows about the cached ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingMetadata {
    /// Last calculation, if the cache was ever built.
    pub calculated_at: Option<DateTime<Utc>>,
    /// Revision the cache was built from.
    pub revision: Option<DataRevision>,
    /// Cached rows.
    pub entry_count: usize,
}

/// Filters for reading the ranking cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingQuery {
    /// Inclusive lower bound on the composite score.
    pub min_score: Option<Decimal>,
    /// Inclusive upper bound on the composite score.
    pub max_score: Option<Decimal>,
    /// Maximum rows returned.
    pub limit: Option<usize>,
}

impl RankingQuery {
    /// Whether an entry passes the score bounds.
    #[must_use]
    pub fn accepts(&self, entry: &RankingEntry) -> bool {
        self.min_score.is_none_or(|min| entry.composite_score >= min)
            && self.max_score.is_none_or(|max| entry.composite_score <= max)
    }
}

/// Freshness of the ranking cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringStatus {
    /// Whether the cache holds any rows.
    pub cache_populated: bool,
    /// Cached rows.
    pub ranked_projects: usize,
    /// Last calculation.
    pub last_calculated_at: Option<DateTime<Utc>>,
    /// Revision the cache was built from.
    pub cached_revision: Option<DataRevision>,
    /// Current revision; `None` when it could not be read.
    pub current_revision: Option<DataRevision>,
    /// Whether criteria or scores changed since the cache was built.
    pub is_stale: bool,
}

impl ScoringStatus {
    /// Status reported when the store cannot be read.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            cache_populated: false,
            ranked_projects: 0,
            last_calculated_at: None,
            cached_revision: None,
            current_revision: None,
            is_stale: true,
        }
    }
}

/// Alternative weights for a what-if comparison.
///
/// Active criteria missing from `weights` keep their current weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightScenario {
    /// Label shown to the caller.
    pub name: String,
    /// Weight overrides.
    pub weights: BTreeMap<CriterionId, Decimal>,
}

/// Composite under one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario label.
    pub name: String,
    /// Composite under the scenario weights.
    pub composite_score: Decimal,
    /// `composite_score - baseline`.
    pub delta: Decimal,
}

/// What-if comparison for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    /// Project.
    pub project_id: ProjectId,
    /// Composite under the current weights.
    pub baseline: Decimal,
    /// One result per scenario, in request order.
    pub scenarios: Vec<ScenarioResult>,
}
