//! Environmental impact scorer.

use std::future::Future;
use std::sync::Arc;

use keystone_shared::types::{Actor, ProjectId};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::curve;
use super::error::EnvironmentalError;
use super::types::{AutoScoreResult, EnvironmentalImpact, GreenUpgrade};
use crate::criteria::{CriteriaRegistry, CriteriaRepository};
use crate::scoring::{ScoreInput, ScoreRepository, ScoringEngine};
use crate::store::StoreError;

/// Read-only source of green upgrade records.
pub trait GreenUpgradeSource: Send + Sync {
    /// Green upgrades of one project, any status.
    fn list_green_upgrades(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<GreenUpgrade>, StoreError>> + Send;
}

/// Scores projects on the environmental criterion from their green upgrades.
pub struct EnvironmentalImpactScorer<R: CriteriaRepository> {
    repo: Arc<R>,
    registry: CriteriaRegistry<R>,
    scoring: ScoringEngine<R>,
}

impl<R> EnvironmentalImpactScorer<R>
where
    R: CriteriaRepository + ScoreRepository + GreenUpgradeSource,
{
    /// Create a new scorer.
    #[must_use]
    pub fn new(repo: Arc<R>, registry: CriteriaRegistry<R>, scoring: ScoringEngine<R>) -> Self {
        Self {
            repo,
            registry,
            scoring,
        }
    }

    /// Aggregated impact of a project's non-cancelled upgrades.
    ///
    /// Returns an empty impact when the store is unavailable.
    ///
    /// # Errors
    ///
    /// Returns an error for non-transient store failures.
    pub async fn get_project_environmental_impact(
        &self,
        project_id: ProjectId,
    ) -> Result<EnvironmentalImpact, EnvironmentalError> {
        match self.aggregate(project_id).await {
            Err(err) if err.is_transient() => {
                warn!(project_id = %project_id, error = %err, "Green upgrades unavailable, returning empty impact");
                Ok(EnvironmentalImpact::empty(project_id))
            }
            other => other.map_err(Into::into),
        }
    }

    /// Maps annual GHG reduction (t CO2e) to the 0–100 environmental score.
    #[must_use]
    pub fn calculate_environmental_score(ghg_reduction_tonnes: Decimal) -> Decimal {
        curve::environmental_score(ghg_reduction_tonnes)
    }

    /// Writes the project's environmental criterion score through the scoring engine.
    ///
    /// Provisions the environmental criterion first if needed. Runs as the system actor.
    ///
    /// # Errors
    ///
    /// Returns an error if the upgrades cannot be read, the criterion cannot be
    /// provisioned, or the existing score is locked.
    pub async fn auto_score_project_environmental(
        &self,
        project_id: ProjectId,
    ) -> Result<AutoScoreResult, EnvironmentalError> {
        let impact = self.aggregate(project_id).await?;
        let criterion = self.registry.ensure_environmental_criteria().await?;
        let criterion_score = curve::criterion_score(impact.environmental_score);

        let justification = format!(
            "Auto-scored from {} green upgrade(s): {} t CO2e/yr reduction, environmental score {}",
            impact.upgrade_count, impact.total_ghg_reduction_tonnes, impact.environmental_score
        );
        self.scoring
            .score_project(
                &Actor::system(),
                project_id,
                vec![ScoreInput::new(criterion.id, criterion_score, Some(&justification))],
            )
            .await?;

        info!(
            project_id = %project_id,
            ghg_tonnes = %impact.total_ghg_reduction_tonnes,
            environmental_score = %impact.environmental_score,
            criterion_score = %criterion_score,
            "Environmental score recorded"
        );
        Ok(AutoScoreResult {
            project_id,
            criteria_id: criterion.id,
            impact,
            criterion_score,
        })
    }

    async fn aggregate(&self, project_id: ProjectId) -> Result<EnvironmentalImpact, StoreError> {
        let upgrades = self.repo.list_green_upgrades(project_id).await?;
        let mut impact = EnvironmentalImpact::empty(project_id);
        for upgrade in upgrades
            .iter()
            .filter(|u| u.project_id == project_id && u.status.counts_toward_impact())
        {
            impact.upgrade_count += 1;
            impact.total_energy_savings_kwh += upgrade.energy_savings_kwh;
            impact.total_water_savings_gallons += upgrade.water_savings_gallons;
            impact.total_ghg_reduction_tonnes += upgrade.ghg_reduction_tonnes;
        }
        impact.environmental_score = curve::environmental_score(impact.total_ghg_reduction_tonnes);
        Ok(impact)
    }
}
