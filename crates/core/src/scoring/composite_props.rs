//! Property-based tests for the composite score.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use keystone_shared::types::{CriterionId, ProjectId, UserId};

use super::composite::CompositeCalculator;
use super::types::{ProjectScore, ScoreStatus};

fn arb_weight() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|n| Decimal::new(n, 2))
}

fn arb_score() -> impl Strategy<Value = Decimal> {
    (0i64..=1_000).prop_map(|n| Decimal::new(n, 2))
}

/// Criteria as (weight, optional score) rows.
fn arb_rows() -> impl Strategy<Value = Vec<(Decimal, Option<Decimal>)>> {
    prop::collection::vec((arb_weight(), prop::option::of(arb_score())), 0..=15)
}

fn build(
    project: ProjectId,
    rows: &[(Decimal, Option<Decimal>)],
) -> (Vec<(CriterionId, Decimal)>, Vec<ProjectScore>) {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap_or_default();
    let mut weights = Vec::new();
    let mut scores = Vec::new();
    for (idx, (weight, score)) in rows.iter().enumerate() {
        let id = CriterionId::from_uuid(Uuid::from_u128(idx as u128 + 1));
        weights.push((id, *weight));
        if let Some(score) = score {
            scores.push(ProjectScore {
                project_id: project,
                criteria_id: id,
                score: *score,
                justification: None,
                status: ScoreStatus::Draft,
                scored_by: UserId::new(),
                created_at: at,
                updated_at: at,
            });
        }
    }
    (weights, scores)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// The composite always lands in [0, 100] with at most two decimals.
    #[test]
    fn prop_composite_in_range(rows in arb_rows()) {
        let project = ProjectId::new();
        let (weights, scores) = build(project, &rows);
        let result = CompositeCalculator::compute(project, &weights, &scores);
        prop_assert!(result.composite >= Decimal::ZERO);
        prop_assert!(result.composite <= Decimal::ONE_HUNDRED);
        prop_assert_eq!(result.composite, result.composite.round_dp(2));
    }

    /// Adding an unscored criterion of any weight does not move the composite.
    #[test]
    fn prop_unscored_criterion_is_excluded(rows in arb_rows(), extra in arb_weight()) {
        let project = ProjectId::new();
        let (mut weights, scores) = build(project, &rows);
        let before = CompositeCalculator::compute(project, &weights, &scores).composite;
        weights.push((CriterionId::new(), extra));
        let after = CompositeCalculator::compute(project, &weights, &scores).composite;
        prop_assert_eq!(before, after);
    }

    /// A uniform score s on every scored criterion yields 10·s, whatever the weights.
    #[test]
    fn prop_uniform_score_is_ten_times_score(
        weights in prop::collection::vec(1i64..=10_000, 1..=10),
        score in arb_score(),
    ) {
        let rows: Vec<_> = weights
            .into_iter()
            .map(|w| (Decimal::new(w, 2), Some(score)))
            .collect();
        let project = ProjectId::new();
        let (weights, scores) = build(project, &rows);
        let result = CompositeCalculator::compute(project, &weights, &scores);
        prop_assert_eq!(result.composite, (score * Decimal::TEN).round_dp(2));
    }
}
