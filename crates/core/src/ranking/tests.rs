use std::collections::BTreeMap;
use std::sync::Arc;

use keystone_shared::types::{CriterionId, ProjectId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::criteria::{CriteriaRepository, Criterion};
use crate::fixtures::{assessor, seed_criteria, store};
use crate::memory::InMemoryStore;
use crate::scoring::{ScoreInput, ScoringEngine};

struct Harness {
    store: Arc<InMemoryStore>,
    scoring: ScoringEngine<InMemoryStore>,
    ranking: RankingService<InMemoryStore>,
    criteria: Vec<Criterion>,
}

impl Harness {
    async fn new(rows: &[(&str, Decimal)]) -> Self {
        let store = store();
        let criteria = seed_criteria(&store, rows).await;
        Self {
            scoring: ScoringEngine::new(Arc::clone(&store)),
            ranking: RankingService::new(Arc::clone(&store)),
            store,
            criteria,
        }
    }

    async fn score(&self, project: ProjectId, scores: &[Decimal]) {
        let inputs = self
            .criteria
            .iter()
            .zip(scores)
            .map(|(c, &s)| ScoreInput::new(c.id, s, None))
            .collect();
        self.scoring
            .score_project(&assessor(), project, inputs)
            .await
            .expect("score");
    }
}

#[tokio::test]
async fn test_ranked_projects_come_back_in_rank_order() {
    let harness = Harness::new(&[("A", dec!(60)), ("B", dec!(40))]).await;
    let projects: Vec<ProjectId> = (0..6).map(|_| ProjectId::new()).collect();
    let grid = [
        [dec!(10), dec!(5)],
        [dec!(2), dec!(3)],
        [dec!(7), dec!(7)],
        [dec!(9), dec!(9)],
        [dec!(5), dec!(10)],
        [dec!(7), dec!(7)],
    ];
    for (project, scores) in projects.iter().zip(&grid) {
        harness.score(*project, scores).await;
    }

    let snapshot = harness
        .ranking
        .calculate_all_project_scores()
        .await
        .expect("calculate");
    assert_eq!(snapshot.entries.len(), 6);

    let ranked = harness
        .ranking
        .get_ranked_projects(&RankingQuery::default())
        .await
        .expect("ranked");
    assert_eq!(ranked, snapshot.entries);
    assert!(RankAssigner::is_well_ordered(&ranked));
    let ranks: Vec<u32> = ranked.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(ranked[0].composite_score, dec!(90));
    assert_eq!(ranked[0].project_id, projects[3]);
    assert_eq!(ranked[1].composite_score, dec!(80));

    // equal composites break on project id
    let tied: Vec<ProjectId> = ranked
        .iter()
        .filter(|e| e.composite_score == dec!(70))
        .map(|e| e.project_id)
        .collect();
    assert_eq!(tied, vec![projects[2], projects[4], projects[5]]);
}

#[tokio::test]
async fn test_unscored_projects_are_not_ranked() {
    let harness = Harness::new(&[("A", dec!(100))]).await;
    harness.score(ProjectId::new(), &[dec!(4)]).await;

    let snapshot = harness
        .ranking
        .calculate_all_project_scores()
        .await
        .expect("calculate");
    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(snapshot.entries[0].scored_criteria, 1);
}

#[tokio::test]
async fn test_reads_never_recompute() {
    let harness = Harness::new(&[("A", dec!(100))]).await;
    harness.score(ProjectId::new(), &[dec!(4)]).await;

    let ranked = harness
        .ranking
        .get_ranked_projects(&RankingQuery::default())
        .await
        .expect("ranked");
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn test_bounds_and_limit_filter_cached_rows() {
    let harness = Harness::new(&[("A", dec!(100))]).await;
    for score in [dec!(2), dec!(4), dec!(6), dec!(8), dec!(10)] {
        harness.score(ProjectId::new(), &[score]).await;
    }
    harness
        .ranking
        .calculate_all_project_scores()
        .await
        .expect("calculate");

    let query = RankingQuery {
        min_score: Some(dec!(40)),
        max_score: Some(dec!(80)),
        limit: Some(2),
    };
    let ranked = harness.ranking.get_ranked_projects(&query).await.expect("ranked");
    let scores: Vec<Decimal> = ranked.iter().map(|e| e.composite_score).collect();
    assert_eq!(scores, vec![dec!(80), dec!(60)]);
    assert_eq!(ranked[0].rank, 2);

    let inverted = RankingQuery {
        min_score: Some(dec!(90)),
        max_score: Some(dec!(10)),
        limit: None,
    };
    let result = harness.ranking.get_ranked_projects(&inverted).await;
    assert!(matches!(result, Err(RankingError::InvalidBounds { .. })));
}

#[tokio::test]
async fn test_status_tracks_staleness() {
    let harness = Harness::new(&[("A", dec!(100))]).await;
    let project = ProjectId::new();
    harness.score(project, &[dec!(5)]).await;

    let before = harness.ranking.get_scoring_status().await.expect("status");
    assert!(!before.cache_populated);
    assert!(before.is_stale);

    harness
        .ranking
        .calculate_all_project_scores()
        .await
        .expect("calculate");
    let fresh = harness.ranking.get_scoring_status().await.expect("status");
    assert!(fresh.cache_populated);
    assert!(!fresh.is_stale);
    assert_eq!(fresh.ranked_projects, 1);
    assert!(fresh.last_calculated_at.is_some());

    harness.score(project, &[dec!(6)]).await;
    let stale = harness.ranking.get_scoring_status().await.expect("status");
    assert!(stale.is_stale);
    assert_eq!(stale.cached_revision, fresh.cached_revision);
}

#[tokio::test]
async fn test_reads_degrade_when_store_is_down() {
    let harness = Harness::new(&[("A", dec!(100))]).await;
    harness.score(ProjectId::new(), &[dec!(5)]).await;
    harness
        .ranking
        .calculate_all_project_scores()
        .await
        .expect("calculate");
    harness.store.set_unavailable(true);

    let ranked = harness
        .ranking
        .get_ranked_projects(&RankingQuery::default())
        .await
        .expect("ranked");
    assert!(ranked.is_empty());

    let status = harness.ranking.get_scoring_status().await.expect("status");
    assert_eq!(status, ScoringStatus::unknown());

    let rebuild = harness.ranking.calculate_all_project_scores().await;
    assert!(matches!(rebuild, Err(RankingError::Store(_))));
}

#[tokio::test]
async fn test_scenarios_report_deltas_without_persisting() {
    let harness = Harness::new(&[("A", dec!(60)), ("B", dec!(40))]).await;
    let project = ProjectId::new();
    harness.score(project, &[dec!(10), dec!(5)]).await;
    let (a, b) = (harness.criteria[0].id, harness.criteria[1].id);

    let scenarios = [
        WeightScenario {
            name: "risk heavy".into(),
            weights: BTreeMap::from([(a, dec!(90)), (b, dec!(10))]),
        },
        WeightScenario {
            name: "equal".into(),
            weights: BTreeMap::from([(a, dec!(50)), (b, dec!(50))]),
        },
        WeightScenario {
            name: "b only".into(),
            weights: BTreeMap::from([(a, dec!(0))]),
        },
    ];
    let comparison = harness
        .ranking
        .compare_weighting_scenarios(project, &scenarios)
        .await
        .expect("compare");

    assert_eq!(comparison.baseline, dec!(80));
    let results: Vec<(Decimal, Decimal)> = comparison
        .scenarios
        .iter()
        .map(|s| (s.composite_score, s.delta))
        .collect();
    assert_eq!(
        results,
        vec![(dec!(95), dec!(15)), (dec!(75), dec!(-5)), (dec!(50), dec!(-30))]
    );

    let weights: Vec<Decimal> = harness
        .store
        .load_criteria()
        .await
        .expect("criteria")
        .active()
        .iter()
        .map(|c| c.weight)
        .collect();
    assert_eq!(weights, vec![dec!(60), dec!(40)]);
}

#[tokio::test]
async fn test_scenario_weights_are_validated() {
    let harness = Harness::new(&[("A", dec!(100))]).await;
    let project = ProjectId::new();
    let a = harness.criteria[0].id;

    let negative = [WeightScenario {
        name: "broken".into(),
        weights: BTreeMap::from([(a, dec!(-5))]),
    }];
    let result = harness.ranking.compare_weighting_scenarios(project, &negative).await;
    assert!(matches!(
        result,
        Err(RankingError::InvalidScenarioWeight { ref scenario, .. }) if scenario == "broken"
    ));

    let unknown = [WeightScenario {
        name: "ghost".into(),
        weights: BTreeMap::from([(CriterionId::new(), dec!(5))]),
    }];
    let result = harness.ranking.compare_weighting_scenarios(project, &unknown).await;
    assert!(matches!(result, Err(RankingError::UnknownCriterion { .. })));
}
