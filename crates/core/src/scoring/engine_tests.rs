use std::sync::Arc;

use keystone_shared::types::ProjectId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::audit::{AuditTrail, ScoringAuditAction};
use crate::criteria::Criterion;
use crate::fixtures::{assessor, manager, registry, seed_criteria, store, viewer};
use crate::memory::InMemoryStore;

async fn engine_with(rows: &[(&str, Decimal)]) -> (Arc<InMemoryStore>, ScoringEngine<InMemoryStore>, Vec<Criterion>) {
    let store = store();
    let criteria = seed_criteria(&store, rows).await;
    let engine = ScoringEngine::new(Arc::clone(&store));
    (store, engine, criteria)
}

#[tokio::test]
async fn test_composite_of_two_weighted_criteria() {
    let (_store, engine, criteria) = engine_with(&[("A", dec!(60)), ("B", dec!(40))]).await;
    let project = ProjectId::new();

    engine
        .score_project(
            &assessor(),
            project,
            vec![
                ScoreInput::new(criteria[0].id, dec!(10), None),
                ScoreInput::new(criteria[1].id, dec!(5), None),
            ],
        )
        .await
        .expect("score");

    let composite = engine.calculate_composite_score(project).await.expect("composite");
    assert_eq!(composite.composite, dec!(80));
    assert_eq!(composite.scored_criteria, 2);
    assert_eq!(composite.total_criteria, 2);
}

#[tokio::test]
async fn test_scores_round_trip_unchanged() {
    let (_store, engine, criteria) = engine_with(&[("A", dec!(100))]).await;
    let project = ProjectId::new();

    engine
        .score_project(
            &assessor(),
            project,
            vec![ScoreInput::new(criteria[0].id, dec!(7.35), Some("roof membrane failing"))],
        )
        .await
        .expect("score");

    let scores = engine.get_project_scores(project).await.expect("scores");
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].score, dec!(7.35));
    assert_eq!(scores[0].justification.as_deref(), Some("roof membrane failing"));
    assert_eq!(scores[0].status, ScoreStatus::Draft);
}

#[tokio::test]
async fn test_invalid_request_writes_nothing() {
    let (_store, engine, criteria) = engine_with(&[("A", dec!(50)), ("B", dec!(50))]).await;
    let project = ProjectId::new();

    let result = engine
        .score_project(
            &assessor(),
            project,
            vec![
                ScoreInput::new(criteria[0].id, dec!(6), None),
                ScoreInput::new(criteria[1].id, dec!(10.5), None),
            ],
        )
        .await;

    assert!(matches!(result, Err(ScoringError::ScoreOutOfRange { .. })));
    assert!(engine.get_project_scores(project).await.expect("scores").is_empty());

    let negative = engine
        .score_project(&assessor(), project, vec![ScoreInput::new(criteria[0].id, dec!(-1), None)])
        .await;
    assert!(matches!(negative, Err(ScoringError::ScoreOutOfRange { .. })));

    let duplicate = engine
        .score_project(
            &assessor(),
            project,
            vec![
                ScoreInput::new(criteria[0].id, dec!(6), None),
                ScoreInput::new(criteria[0].id, dec!(7), None),
            ],
        )
        .await;
    assert!(matches!(duplicate, Err(ScoringError::DuplicateCriterion(_))));
}

#[tokio::test]
async fn test_inactive_criterion_cannot_be_scored() {
    let (store, engine, criteria) = engine_with(&[("A", dec!(50)), ("B", dec!(50))]).await;
    registry(&store)
        .delete_criteria(&manager(), criteria[1].id)
        .await
        .expect("delete");

    let result = engine
        .score_project(&assessor(), ProjectId::new(), vec![ScoreInput::new(criteria[1].id, dec!(5), None)])
        .await;
    assert!(matches!(result, Err(ScoringError::InactiveCriterion(id)) if id == criteria[1].id));
}

#[tokio::test]
async fn test_viewer_cannot_score() {
    let (_store, engine, criteria) = engine_with(&[("A", dec!(100))]).await;

    let result = engine
        .score_project(&viewer(), ProjectId::new(), vec![ScoreInput::new(criteria[0].id, dec!(5), None)])
        .await;
    assert!(matches!(result, Err(ScoringError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_rescore_keeps_status_and_is_audited() {
    let (store, engine, criteria) = engine_with(&[("A", dec!(100))]).await;
    let project = ProjectId::new();
    let id = criteria[0].id;

    engine
        .score_project(&assessor(), project, vec![ScoreInput::new(id, dec!(4), None)])
        .await
        .expect("score");
    engine
        .update_score_status(&assessor(), project, id, ScoreStatus::Submitted)
        .await
        .expect("submit");
    engine
        .score_project(&assessor(), project, vec![ScoreInput::new(id, dec!(6), Some("re-inspected"))])
        .await
        .expect("rescore");

    let scores = engine.get_project_scores(project).await.expect("scores");
    assert_eq!(scores[0].score, dec!(6));
    assert_eq!(scores[0].status, ScoreStatus::Submitted);

    let history = AuditTrail::new(Arc::clone(&store), 50)
        .get_criterion_audit_history(project, id)
        .await
        .expect("history");
    let actions: Vec<ScoringAuditAction> = history.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            ScoringAuditAction::Rescored,
            ScoringAuditAction::StatusChanged,
            ScoringAuditAction::Scored,
        ]
    );
    assert_eq!(history[0].old_score, Some(dec!(4)));
    assert_eq!(history[0].new_score, Some(dec!(6)));
}

#[tokio::test]
async fn test_locked_score_rejects_rescore() {
    let (_store, engine, criteria) = engine_with(&[("A", dec!(100))]).await;
    let project = ProjectId::new();
    let id = criteria[0].id;

    engine
        .score_project(&assessor(), project, vec![ScoreInput::new(id, dec!(9), None)])
        .await
        .expect("score");
    engine.submit_all_project_scores(&assessor(), project).await.expect("submit");
    engine.lock_all_project_scores(&manager(), project).await.expect("lock");

    let result = engine
        .score_project(&assessor(), project, vec![ScoreInput::new(id, dec!(2), None)])
        .await;
    assert!(matches!(result, Err(ScoringError::Locked(locked)) if locked == id));
    assert_eq!(engine.get_project_scores(project).await.expect("scores")[0].score, dec!(9));
}

#[tokio::test]
async fn test_status_must_advance_one_step() {
    let (_store, engine, criteria) = engine_with(&[("A", dec!(100))]).await;
    let project = ProjectId::new();
    let id = criteria[0].id;
    engine
        .score_project(&assessor(), project, vec![ScoreInput::new(id, dec!(3), None)])
        .await
        .expect("score");

    let skip = engine
        .update_score_status(&manager(), project, id, ScoreStatus::Locked)
        .await;
    assert!(matches!(
        skip,
        Err(ScoringError::InvalidTransition {
            from: ScoreStatus::Draft,
            to: ScoreStatus::Locked
        })
    ));

    let back = engine.update_score_status(&assessor(), project, id, ScoreStatus::Draft).await;
    assert!(matches!(back, Err(ScoringError::InvalidTransition { .. })));

    let missing = engine
        .update_score_status(&assessor(), ProjectId::new(), id, ScoreStatus::Submitted)
        .await;
    assert!(matches!(missing, Err(ScoringError::ScoreNotFound { .. })));
}

#[tokio::test]
async fn test_locking_requires_manager() {
    let (_store, engine, criteria) = engine_with(&[("A", dec!(100))]).await;
    let project = ProjectId::new();
    engine
        .score_project(&assessor(), project, vec![ScoreInput::new(criteria[0].id, dec!(3), None)])
        .await
        .expect("score");
    engine.submit_all_project_scores(&assessor(), project).await.expect("submit");

    let result = engine.lock_all_project_scores(&assessor(), project).await;
    assert!(matches!(result, Err(ScoringError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_submit_all_only_promotes_drafts() {
    let (_store, engine, criteria) = engine_with(&[("A", dec!(50)), ("B", dec!(50))]).await;
    let project = ProjectId::new();
    engine
        .score_project(
            &assessor(),
            project,
            vec![
                ScoreInput::new(criteria[0].id, dec!(5), None),
                ScoreInput::new(criteria[1].id, dec!(5), None),
            ],
        )
        .await
        .expect("score");
    engine
        .update_score_status(&assessor(), project, criteria[0].id, ScoreStatus::Submitted)
        .await
        .expect("submit one");

    let promoted = engine.submit_all_project_scores(&assessor(), project).await.expect("submit all");
    assert_eq!(promoted.len(), 1);
    assert_eq!(promoted[0].criteria_id, criteria[1].id);

    let again = engine.submit_all_project_scores(&assessor(), project).await.expect("noop");
    assert!(again.is_empty());

    let locked = engine.lock_all_project_scores(&manager(), project).await.expect("lock");
    assert_eq!(locked.len(), 2);
    assert!(locked.iter().all(|s| s.status == ScoreStatus::Locked));
}

#[tokio::test]
async fn test_progress_counts_active_criteria_only() {
    let (store, engine, criteria) =
        engine_with(&[("A", dec!(25)), ("B", dec!(25)), ("C", dec!(25)), ("D", dec!(25))]).await;
    let project = ProjectId::new();
    engine
        .score_project(
            &assessor(),
            project,
            vec![
                ScoreInput::new(criteria[0].id, dec!(5), None),
                ScoreInput::new(criteria[1].id, dec!(5), None),
                ScoreInput::new(criteria[2].id, dec!(5), None),
            ],
        )
        .await
        .expect("score");
    engine
        .update_score_status(&assessor(), project, criteria[0].id, ScoreStatus::Submitted)
        .await
        .expect("submit");
    registry(&store)
        .delete_criteria(&manager(), criteria[2].id)
        .await
        .expect("delete");

    let progress = engine.get_scoring_progress(project).await.expect("progress");
    assert_eq!(progress.total_criteria, 3);
    assert_eq!(progress.scored_criteria, 2);
    assert_eq!(progress.unscored_criteria, 1);
    assert_eq!(progress.draft, 1);
    assert_eq!(progress.submitted, 1);
    assert_eq!(progress.completion_percent, dec!(66.67));
}

#[tokio::test]
async fn test_progress_degrades_when_store_is_down() {
    let (store, engine, _criteria) = engine_with(&[("A", dec!(100))]).await;
    store.set_unavailable(true);

    let progress = engine.get_scoring_progress(ProjectId::new()).await.expect("progress");
    assert_eq!(progress, ScoringProgress::default());

    let scores = engine.get_project_scores(ProjectId::new()).await;
    assert!(matches!(scores, Err(ScoringError::Store(_))));
}

#[tokio::test]
async fn test_composite_ignores_inactive_criteria_scores() {
    let (store, engine, criteria) = engine_with(&[("A", dec!(50)), ("B", dec!(50))]).await;
    let project = ProjectId::new();
    engine
        .score_project(
            &assessor(),
            project,
            vec![
                ScoreInput::new(criteria[0].id, dec!(9), None),
                ScoreInput::new(criteria[1].id, dec!(1), None),
            ],
        )
        .await
        .expect("score");
    registry(&store)
        .delete_criteria(&manager(), criteria[1].id)
        .await
        .expect("delete");

    let composite = engine.calculate_composite_score(project).await.expect("composite");
    assert_eq!(composite.composite, dec!(90));
    assert_eq!(composite.total_criteria, 1);
}
