//! Weighted composite score.
//!
//! `composite = (Σ score·weight / Σ weight) · 10` over the criteria the
//! project has a score for. Unscored criteria drop out of both sums rather
//! than counting as zero.

use std::collections::HashMap;

use keystone_shared::types::{CriterionId, ProjectId};
use rust_decimal::Decimal;

use super::types::{CompositeScore, CriterionContribution, ProjectScore};
use crate::criteria::Criterion;

/// Stateless composite score calculator, shared by live scoring and what-if scenarios.
pub struct CompositeCalculator;

impl CompositeCalculator {
    /// Weight vector of the given criteria, in order.
    #[must_use]
    pub fn weights_of(criteria: &[&Criterion]) -> Vec<(CriterionId, Decimal)> {
        criteria.iter().map(|c| (c.id, c.weight)).collect()
    }

    /// Computes the composite for one project.
    ///
    /// Scores on criteria absent from `weights` are ignored.
    #[must_use]
    pub fn compute(
        project_id: ProjectId,
        weights: &[(CriterionId, Decimal)],
        scores: &[ProjectScore],
    ) -> CompositeScore {
        let by_criterion: HashMap<CriterionId, Decimal> = scores
            .iter()
            .filter(|s| s.project_id == project_id)
            .map(|s| (s.criteria_id, s.score))
            .collect();

        let mut contributions = Vec::new();
        let mut weighted_sum = Decimal::ZERO;
        let mut scored_weight = Decimal::ZERO;
        for &(criteria_id, weight) in weights {
            let Some(&score) = by_criterion.get(&criteria_id) else {
                continue;
            };
            let weighted = score * weight;
            weighted_sum += weighted;
            scored_weight += weight;
            contributions.push(CriterionContribution {
                criteria_id,
                weight,
                score,
                weighted,
            });
        }

        CompositeScore {
            project_id,
            composite: Self::composite(weighted_sum, scored_weight),
            scored_weight,
            scored_criteria: contributions.len(),
            total_criteria: weights.len(),
            contributions,
        }
    }

    fn composite(weighted_sum: Decimal, scored_weight: Decimal) -> Decimal {
        if scored_weight <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let value = (weighted_sum / scored_weight * Decimal::TEN).round_dp(2);
        value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
    }
}
