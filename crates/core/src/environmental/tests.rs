use std::sync::Arc;

use keystone_shared::types::{GreenUpgradeId, ProjectId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::criteria::CriterionCategory;
use crate::fixtures::{assessor, manager, registry, seed_criteria, store};
use crate::memory::InMemoryStore;
use crate::scoring::{ScoreStatus, ScoringEngine};

fn scorer(store: &Arc<InMemoryStore>) -> EnvironmentalImpactScorer<InMemoryStore> {
    EnvironmentalImpactScorer::new(
        Arc::clone(store),
        registry(store),
        ScoringEngine::new(Arc::clone(store)),
    )
}

fn upgrade(project_id: ProjectId, status: GreenUpgradeStatus, ghg: Decimal) -> GreenUpgrade {
    GreenUpgrade {
        id: GreenUpgradeId::new(),
        project_id,
        name: "LED retrofit".to_string(),
        status,
        energy_savings_kwh: dec!(12000),
        water_savings_gallons: dec!(0),
        ghg_reduction_tonnes: ghg,
    }
}

#[tokio::test]
async fn test_auto_score_maps_reduction_through_curve() {
    let store = store();
    seed_criteria(&store, &[("Risk", dec!(100))]).await;
    let project = ProjectId::new();
    store
        .add_green_upgrade(upgrade(project, GreenUpgradeStatus::Planned, dec!(45)))
        .await;
    store
        .add_green_upgrade(upgrade(project, GreenUpgradeStatus::Completed, dec!(30)))
        .await;

    let result = scorer(&store)
        .auto_score_project_environmental(project)
        .await
        .expect("auto score");

    assert_eq!(result.impact.total_ghg_reduction_tonnes, dec!(75));
    assert_eq!(result.impact.environmental_score, dec!(85));
    assert_eq!(result.criterion_score, dec!(9));

    let scores = ScoringEngine::new(Arc::clone(&store))
        .get_project_scores(project)
        .await
        .expect("scores");
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].criteria_id, result.criteria_id);
    assert_eq!(scores[0].score, dec!(9));
    assert_eq!(scores[0].status, ScoreStatus::Draft);
    assert!(scores[0].justification.as_deref().is_some_and(|j| j.contains("75")));
}

#[tokio::test]
async fn test_auto_score_provisions_criterion_once() {
    let store = store();
    seed_criteria(&store, &[("Risk", dec!(100))]).await;
    let first = ProjectId::new();
    let second = ProjectId::new();
    store
        .add_green_upgrade(upgrade(first, GreenUpgradeStatus::InProgress, dec!(10)))
        .await;

    let scorer = scorer(&store);
    let a = scorer.auto_score_project_environmental(first).await.expect("first");
    let b = scorer.auto_score_project_environmental(second).await.expect("second");

    assert_eq!(a.criteria_id, b.criteria_id);
    assert_eq!(a.criterion_score, dec!(4));
    assert_eq!(b.criterion_score, Decimal::ZERO);

    let active = registry(&store).list_criteria(false).await.expect("criteria");
    let environmental: Vec<_> = active
        .iter()
        .filter(|c| c.category == CriterionCategory::Environmental)
        .collect();
    assert_eq!(environmental.len(), 1);
}

#[tokio::test]
async fn test_rescoring_overwrites_previous_auto_score() {
    let store = store();
    let project = ProjectId::new();
    store
        .add_green_upgrade(upgrade(project, GreenUpgradeStatus::Planned, dec!(10)))
        .await;
    let scorer = scorer(&store);
    scorer.auto_score_project_environmental(project).await.expect("first");

    store
        .add_green_upgrade(upgrade(project, GreenUpgradeStatus::InProgress, dec!(40)))
        .await;
    let result = scorer.auto_score_project_environmental(project).await.expect("second");

    assert_eq!(result.impact.environmental_score, dec!(70));
    let scores = ScoringEngine::new(Arc::clone(&store))
        .get_project_scores(project)
        .await
        .expect("scores");
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].score, dec!(7));
}

#[tokio::test]
async fn test_cancelled_upgrades_do_not_count() {
    let store = store();
    let project = ProjectId::new();
    let other = ProjectId::new();
    store
        .add_green_upgrade(upgrade(project, GreenUpgradeStatus::Completed, dec!(20)))
        .await;
    store
        .add_green_upgrade(upgrade(project, GreenUpgradeStatus::Cancelled, dec!(500)))
        .await;
    store
        .add_green_upgrade(upgrade(other, GreenUpgradeStatus::Completed, dec!(80)))
        .await;

    let impact = scorer(&store)
        .get_project_environmental_impact(project)
        .await
        .expect("impact");

    assert_eq!(impact.upgrade_count, 1);
    assert_eq!(impact.total_ghg_reduction_tonnes, dec!(20));
    assert_eq!(impact.total_energy_savings_kwh, dec!(12000));
    assert_eq!(impact.environmental_score, dec!(47.5));
}

#[tokio::test]
async fn test_impact_degrades_when_store_is_down() {
    let store = store();
    let project = ProjectId::new();
    store
        .add_green_upgrade(upgrade(project, GreenUpgradeStatus::Completed, dec!(20)))
        .await;
    store.set_unavailable(true);

    let scorer = scorer(&store);
    let impact = scorer
        .get_project_environmental_impact(project)
        .await
        .expect("impact");
    assert_eq!(impact, EnvironmentalImpact::empty(project));

    let auto = scorer.auto_score_project_environmental(project).await;
    assert!(matches!(auto, Err(EnvironmentalError::Store(_))));
}

#[tokio::test]
async fn test_locked_environmental_score_is_not_overwritten() {
    let store = store();
    let project = ProjectId::new();
    let scorer = scorer(&store);
    scorer.auto_score_project_environmental(project).await.expect("first");

    let engine = ScoringEngine::new(Arc::clone(&store));
    engine
        .submit_all_project_scores(&assessor(), project)
        .await
        .expect("submit");
    engine
        .lock_all_project_scores(&manager(), project)
        .await
        .expect("lock");

    let result = scorer.auto_score_project_environmental(project).await;
    assert!(matches!(result, Err(EnvironmentalError::Scoring(_))));
}

#[test]
fn test_environmental_score_is_exposed_on_the_scorer() {
    assert_eq!(
        EnvironmentalImpactScorer::<InMemoryStore>::calculate_environmental_score(dec!(75)),
        dec!(85)
    );
}
