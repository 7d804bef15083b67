//! Ranking service: cache rebuilds, cached reads and what-if scenarios.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use keystone_shared::types::{CriterionId, ProjectId};
use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::error::RankingError;
use super::rank::RankAssigner;
use super::types::{
    RankingEntry, RankingMetadata, RankingQuery, RankingSnapshot, ScenarioComparison,
    ScenarioResult, ScoringStatus, WeightScenario,
};
use crate::criteria::CriteriaRepository;
use crate::scoring::{CompositeCalculator, CompositeScore, ProjectScore, ScoreRepository};
use crate::store::{DataRevision, StoreError};

/// Repository trait for the ranking cache.
pub trait RankingRepository: Send + Sync {
    /// Current criteria and score revisions.
    fn data_revision(&self) -> impl Future<Output = Result<DataRevision, StoreError>> + Send;

    /// Replaces the whole cache in one transaction.
    fn replace_ranking(
        &self,
        snapshot: RankingSnapshot,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Calculation time, revision and size of the cache.
    fn ranking_metadata(&self) -> impl Future<Output = Result<RankingMetadata, StoreError>> + Send;

    /// Cached entries in rank order.
    fn ranked_entries(&self) -> impl Future<Output = Result<Vec<RankingEntry>, StoreError>> + Send;
}

/// Ranking service.
pub struct RankingService<R> {
    repo: Arc<R>,
}

impl<R> Clone for RankingService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R> RankingService<R>
where
    R: CriteriaRepository + ScoreRepository + RankingRepository,
{
    /// Create a new ranking service.
    #[must_use]
    pub const fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Recomputes every scored project's composite and replaces the cache.
    ///
    /// The snapshot records the revision read before the scores, so a write
    /// racing the rebuild leaves the cache marked stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn calculate_all_project_scores(&self) -> Result<RankingSnapshot, RankingError> {
        let revision = self.repo.data_revision().await?;
        let criteria = self.repo.load_criteria().await?;
        let weights = CompositeCalculator::weights_of(&criteria.active());
        let scores = self.repo.list_all_scores().await?;

        let mut by_project: BTreeMap<ProjectId, Vec<ProjectScore>> = BTreeMap::new();
        for score in scores {
            by_project.entry(score.project_id).or_default().push(score);
        }
        let projects: Vec<(ProjectId, Vec<ProjectScore>)> = by_project.into_iter().collect();
        let composites: Vec<CompositeScore> = projects
            .par_iter()
            .map(|(project_id, scores)| CompositeCalculator::compute(*project_id, &weights, scores))
            .collect();

        let snapshot = RankingSnapshot {
            entries: RankAssigner::assign(composites),
            revision,
            calculated_at: Utc::now(),
        };
        self.repo.replace_ranking(snapshot.clone()).await?;

        info!(
            projects = snapshot.entries.len(),
            criteria_revision = revision.criteria,
            score_revision = revision.scores,
            "Ranking cache rebuilt"
        );
        Ok(snapshot)
    }

    /// Reads the ranking cache in rank order. Never recomputes.
    ///
    /// Returns an empty list when the store is unavailable.
    ///
    /// # Errors
    ///
    /// Returns an error for inverted bounds or non-transient store failures.
    pub async fn get_ranked_projects(&self, query: &RankingQuery) -> Result<Vec<RankingEntry>, RankingError> {
        if let (Some(min), Some(max)) = (query.min_score, query.max_score) {
            if min > max {
                return Err(RankingError::InvalidBounds { min, max });
            }
        }

        let entries = match self.repo.ranked_entries().await {
            Ok(entries) => entries,
            Err(err) if err.is_transient() => {
                warn!(error = %err, "Ranking cache unavailable, returning empty ranking");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(entries
            .into_iter()
            .filter(|e| query.accepts(e))
            .take(limit)
            .collect())
    }

    /// Reports whether the cache reflects the latest criteria and scores.
    ///
    /// Returns [`ScoringStatus::unknown`] when the store is unavailable.
    ///
    /// # Errors
    ///
    /// Returns an error for non-transient store failures.
    pub async fn get_scoring_status(&self) -> Result<ScoringStatus, RankingError> {
        match self.status().await {
            Err(err) if err.is_transient() => {
                warn!(error = %err, "Ranking status unavailable, reporting unknown");
                Ok(ScoringStatus::unknown())
            }
            other => other.map_err(Into::into),
        }
    }

    async fn status(&self) -> Result<ScoringStatus, StoreError> {
        let metadata = self.repo.ranking_metadata().await?;
        let current = self.repo.data_revision().await?;
        Ok(ScoringStatus {
            cache_populated: metadata.entry_count > 0,
            ranked_projects: metadata.entry_count,
            last_calculated_at: metadata.calculated_at,
            cached_revision: metadata.revision,
            current_revision: Some(current),
            is_stale: metadata.revision != Some(current),
        })
    }

    /// Composite of one project under alternative weights. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if a scenario weight is outside 0–100, a scenario names
    /// a criterion that is not active, or the store fails.
    pub async fn compare_weighting_scenarios(
        &self,
        project_id: ProjectId,
        scenarios: &[WeightScenario],
    ) -> Result<ScenarioComparison, RankingError> {
        let criteria = self.repo.load_criteria().await?;
        let active = criteria.active();
        let baseline_weights = CompositeCalculator::weights_of(&active);
        let active_ids: HashSet<CriterionId> = active.iter().map(|c| c.id).collect();
        for scenario in scenarios {
            validate_scenario(scenario, &active_ids)?;
        }

        let scores = self.repo.list_project_scores(project_id).await?;
        let baseline = CompositeCalculator::compute(project_id, &baseline_weights, &scores).composite;

        let results = scenarios
            .iter()
            .map(|scenario| {
                let weights: Vec<(CriterionId, Decimal)> = baseline_weights
                    .iter()
                    .map(|&(id, current)| (id, scenario.weights.get(&id).copied().unwrap_or(current)))
                    .collect();
                let composite = CompositeCalculator::compute(project_id, &weights, &scores).composite;
                ScenarioResult {
                    name: scenario.name.clone(),
                    composite_score: composite,
                    delta: composite - baseline,
                }
            })
            .collect();

        Ok(ScenarioComparison {
            project_id,
            baseline,
            scenarios: results,
        })
    }
}

fn validate_scenario(scenario: &WeightScenario, active: &HashSet<CriterionId>) -> Result<(), RankingError> {
    for (&criteria_id, &weight) in &scenario.weights {
        if !active.contains(&criteria_id) {
            return Err(RankingError::UnknownCriterion {
                scenario: scenario.name.clone(),
                criteria_id,
            });
        }
        if weight < Decimal::ZERO || weight > Decimal::ONE_HUNDRED {
            return Err(RankingError::InvalidScenarioWeight {
                scenario: scenario.name.clone(),
                criteria_id,
                weight,
            });
        }
    }
    Ok(())
}
