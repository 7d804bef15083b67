use std::collections::BTreeMap;
use std::sync::Arc;

use keystone_shared::config::BudgetConfig;
use keystone_shared::types::{AllocationId, BudgetCycleId, ProjectId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::error::ErrorKind;
use crate::StoreError;
use crate::fixtures::{assessor, budget_config, manager, seed_criteria, store};
use crate::memory::InMemoryStore;
use crate::ranking::RankingService;
use crate::scoring::{ScoreInput, ScoringEngine};

fn engine(store: &Arc<InMemoryStore>) -> BudgetAllocationEngine<InMemoryStore> {
    BudgetAllocationEngine::new(Arc::clone(store), budget_config())
}

fn cycle_input(start_year: i32, duration_years: i32) -> CreateBudgetCycleInput {
    CreateBudgetCycleInput {
        name: "Capital Plan".to_string(),
        description: None,
        start_year,
        duration_years,
        total_budget: dec!(4_000_000),
        inflation_rate: dec!(3),
        escalation_rate: dec!(2),
        funding_constraints: Vec::new(),
    }
}

fn allocation(cycle: &BudgetCycle, year: i32, amount: Decimal) -> AllocateProjectInput {
    AllocateProjectInput {
        cycle_id: cycle.id,
        project_id: ProjectId::new(),
        year,
        amount,
        priority: None,
        justification: None,
    }
}

#[tokio::test]
async fn test_cycle_bounds_are_derived_and_enforced() {
    let store = store();
    let engine = engine(&store);
    let cycle = engine
        .create_budget_cycle(&manager(), cycle_input(2025, 4))
        .await
        .expect("create");

    assert_eq!(cycle.end_year, 2028);
    assert_eq!(cycle.status, CycleStatus::Planning);

    let result = engine.allocate_project(&manager(), allocation(&cycle, 2029, dec!(1000))).await;
    let err = result.expect_err("2029 is outside the cycle");
    assert!(matches!(err, BudgetError::YearOutOfRange { year: 2029, .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let before = engine.allocate_project(&manager(), allocation(&cycle, 2024, dec!(1000))).await;
    assert!(matches!(before, Err(BudgetError::YearOutOfRange { .. })));

    let last = engine
        .allocate_project(&manager(), allocation(&cycle, 2028, dec!(1000)))
        .await
        .expect("last year");
    assert_eq!(last.status, AllocationStatus::Proposed);
}

#[tokio::test]
async fn test_duration_and_rates_are_clamped() {
    let store = store();
    let engine = engine(&store);
    let mut input = cycle_input(2025, 45);
    input.inflation_rate = dec!(35);
    input.escalation_rate = dec!(-1);

    let cycle = engine.create_budget_cycle(&manager(), input).await.expect("create");
    assert_eq!(cycle.duration_years, 30);
    assert_eq!(cycle.end_year, 2054);
    assert_eq!(cycle.inflation_rate, dec!(20));
    assert_eq!(cycle.escalation_rate, Decimal::ZERO);

    let short = engine
        .create_budget_cycle(&manager(), cycle_input(2025, 0))
        .await
        .expect("create");
    assert_eq!(short.end_year, 2025);
}

#[tokio::test]
async fn test_funding_constraint_rejects_overrun() {
    let store = store();
    let engine = engine(&store);
    let mut input = cycle_input(2025, 3);
    input.funding_constraints = vec![FundingConstraint {
        year: 2026,
        max_amount: dec!(500_000),
    }];
    let cycle = engine.create_budget_cycle(&manager(), input).await.expect("create");

    engine
        .allocate_project(&manager(), allocation(&cycle, 2026, dec!(400_000)))
        .await
        .expect("within cap");
    let err = engine
        .allocate_project(&manager(), allocation(&cycle, 2026, dec!(100_000.01)))
        .await
        .expect_err("over cap");

    assert!(matches!(
        err,
        BudgetError::FundingConstraintExceeded { year: 2026, .. }
    ));
    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert_eq!(engine.list_allocations(cycle.id).await.expect("list").len(), 1);
}

#[tokio::test]
async fn test_store_guard_rejects_batch_over_cap() {
    let store = store();
    let engine = engine(&store);
    let mut input = cycle_input(2025, 3);
    input.funding_constraints = vec![FundingConstraint {
        year: 2026,
        max_amount: dec!(100_000),
    }];
    let cycle = engine.create_budget_cycle(&manager(), input).await.expect("create");
    let first = engine
        .allocate_project(&manager(), allocation(&cycle, 2026, dec!(80_000)))
        .await
        .expect("within cap");

    let mut stale = first.clone();
    stale.id = AllocationId::new();
    stale.allocated_amount = dec!(30_000);
    let result = store
        .apply_budget_writes(vec![
            BudgetWrite::SaveAllocation(stale.clone()),
            BudgetWrite::EnsureWithinFunding {
                cycle_id: cycle.id,
                year: 2026,
            },
        ])
        .await;
    assert_eq!(result, Err(StoreError::Conflict));
    assert_eq!(engine.list_allocations(cycle.id).await.expect("list").len(), 1);

    stale.year = 2027;
    store
        .apply_budget_writes(vec![
            BudgetWrite::SaveAllocation(stale),
            BudgetWrite::EnsureWithinFunding {
                cycle_id: cycle.id,
                year: 2027,
            },
        ])
        .await
        .expect("2027 has no cap");
}

#[tokio::test]
async fn test_concurrent_allocations_cannot_jointly_exceed_cap() {
    let store = store();
    let engine = engine(&store);
    let mut input = cycle_input(2025, 3);
    input.funding_constraints = vec![FundingConstraint {
        year: 2026,
        max_amount: dec!(100_000),
    }];
    let cycle = engine.create_budget_cycle(&manager(), input).await.expect("create");

    let actor = manager();
    let (a, b) = tokio::join!(
        engine.allocate_project(&actor, allocation(&cycle, 2026, dec!(60_000))),
        engine.allocate_project(&actor, allocation(&cycle, 2026, dec!(60_000))),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let err = results.into_iter().find_map(Result::err).expect("one loses");
    assert_eq!(err.kind(), ErrorKind::Consistency);

    let summary = engine.get_budget_summary_by_year(cycle.id).await.expect("summary");
    assert_eq!(summary.total_allocated, dec!(60_000));
    assert!(!summary.has_overrun);
}

#[tokio::test]
async fn test_oversized_amounts_are_rejected_before_any_write() {
    let store = store();
    let engine = engine(&store);
    let cycle = engine
        .create_budget_cycle(&manager(), cycle_input(2025, 4))
        .await
        .expect("create");
    let half = Decimal::MAX / dec!(2) + Decimal::ONE;

    for _ in 0..2 {
        let err = engine
            .allocate_project(&manager(), allocation(&cycle, 2025, half))
            .await
            .expect_err("amount beyond NUMERIC(15,2)");
        assert!(matches!(err, BudgetError::Validation { field: "amount", .. }));
    }
    let summary = engine.get_budget_summary_by_year(cycle.id).await.expect("summary");
    assert_eq!(summary.total_allocated, Decimal::ZERO);

    let mut input = cycle_input(2025, 4);
    input.total_budget = Decimal::MAX;
    assert!(matches!(
        engine.create_budget_cycle(&manager(), input).await,
        Err(BudgetError::Validation { field: "total_budget", .. })
    ));

    let costs = BTreeMap::from([(ProjectId::new(), Decimal::MAX)]);
    assert!(matches!(
        engine.allocate_from_ranking(&manager(), cycle.id, &costs).await,
        Err(BudgetError::Validation { field: "costs", .. })
    ));
}

#[tokio::test]
async fn test_summary_surfaces_overrun_when_not_enforced() {
    let store = store();
    let engine = BudgetAllocationEngine::new(
        Arc::clone(&store),
        BudgetConfig {
            enforce_funding_constraints: false,
        },
    );
    let mut input = cycle_input(2025, 2);
    input.funding_constraints = vec![FundingConstraint {
        year: 2025,
        max_amount: dec!(1_000_000),
    }];
    let cycle = engine.create_budget_cycle(&manager(), input).await.expect("create");
    engine
        .allocate_project(&manager(), allocation(&cycle, 2025, dec!(900_000)))
        .await
        .expect("first");
    engine
        .allocate_project(&manager(), allocation(&cycle, 2025, dec!(200_000)))
        .await
        .expect("second");
    engine
        .allocate_project(&manager(), allocation(&cycle, 2026, dec!(1_050_000)))
        .await
        .expect("third");

    let summary = engine.get_budget_summary_by_year(cycle.id).await.expect("summary");

    assert!(summary.has_overrun);
    assert_eq!(summary.total_allocated, dec!(2_150_000));
    assert_eq!(summary.remaining_budget, dec!(1_850_000));
    assert_eq!(summary.allocation_count, 3);

    let first = &summary.years[0];
    assert_eq!(first.year, 2025);
    assert_eq!(first.allocated, dec!(1_100_000));
    assert_eq!(first.allocation_count, 2);
    assert_eq!(first.headroom, Some(dec!(-100_000)));
    assert!(first.over_constraint);

    let second = &summary.years[1];
    assert_eq!(second.escalation_factor, dec!(1.05));
    assert_eq!(second.base_year_amount, dec!(1_000_000));
    assert_eq!(second.constraint, None);
    assert!(!second.over_constraint);
}

#[tokio::test]
async fn test_delete_cycle_cascades_to_allocations() {
    let store = store();
    let engine = engine(&store);
    let cycle = engine
        .create_budget_cycle(&manager(), cycle_input(2025, 2))
        .await
        .expect("create");
    let kept = engine
        .create_budget_cycle(&manager(), cycle_input(2030, 2))
        .await
        .expect("create");
    let doomed = engine
        .allocate_project(&manager(), allocation(&cycle, 2025, dec!(10)))
        .await
        .expect("allocate");
    engine
        .allocate_project(&manager(), allocation(&kept, 2030, dec!(10)))
        .await
        .expect("allocate");

    engine.delete_budget_cycle(&manager(), cycle.id).await.expect("delete");

    assert!(matches!(
        engine.get_budget_cycle(cycle.id).await,
        Err(BudgetError::CycleNotFound(_))
    ));
    assert!(store.get_allocation(doomed.id).await.expect("get").is_none());
    assert_eq!(engine.list_allocations(kept.id).await.expect("list").len(), 1);
}

#[tokio::test]
async fn test_closed_cycle_rejects_allocation_changes() {
    let store = store();
    let engine = engine(&store);
    let cycle = engine
        .create_budget_cycle(&manager(), cycle_input(2025, 2))
        .await
        .expect("create");
    let existing = engine
        .allocate_project(&manager(), allocation(&cycle, 2025, dec!(10)))
        .await
        .expect("allocate");

    for status in [CycleStatus::Approved, CycleStatus::Active, CycleStatus::Completed] {
        engine
            .transition_cycle_status(&manager(), cycle.id, status)
            .await
            .expect("advance");
    }

    let add = engine.allocate_project(&manager(), allocation(&cycle, 2025, dec!(10))).await;
    assert!(matches!(add, Err(BudgetError::CycleClosed { .. })));
    let remove = engine.delete_allocation(&manager(), existing.id).await;
    assert!(matches!(remove, Err(BudgetError::CycleClosed { .. })));

    let reopen = engine
        .transition_cycle_status(&manager(), cycle.id, CycleStatus::Active)
        .await;
    assert!(matches!(reopen, Err(BudgetError::InvalidCycleTransition { .. })));
}

#[tokio::test]
async fn test_allocation_status_moves_forward_one_step() {
    let store = store();
    let engine = engine(&store);
    let cycle = engine
        .create_budget_cycle(&manager(), cycle_input(2025, 2))
        .await
        .expect("create");
    let created = engine
        .allocate_project(&manager(), allocation(&cycle, 2025, dec!(10)))
        .await
        .expect("allocate");

    let skip = engine
        .update_allocation(
            &manager(),
            created.id,
            UpdateAllocationInput {
                status: Some(AllocationStatus::Funded),
                ..UpdateAllocationInput::default()
            },
        )
        .await;
    assert!(matches!(skip, Err(BudgetError::InvalidAllocationTransition { .. })));

    let approved = engine
        .update_allocation(
            &manager(),
            created.id,
            UpdateAllocationInput {
                status: Some(AllocationStatus::Approved),
                amount: Some(dec!(12.346)),
                year: Some(2026),
                ..UpdateAllocationInput::default()
            },
        )
        .await
        .expect("approve");
    assert_eq!(approved.status, AllocationStatus::Approved);
    assert_eq!(approved.allocated_amount, dec!(12.35));
    assert_eq!(approved.year, 2026);

    let same = engine
        .update_allocation(
            &manager(),
            created.id,
            UpdateAllocationInput {
                status: Some(AllocationStatus::Approved),
                ..UpdateAllocationInput::default()
            },
        )
        .await;
    assert!(same.is_ok());

    let missing = engine
        .update_allocation(&manager(), AllocationId::new(), UpdateAllocationInput::default())
        .await;
    assert!(matches!(missing, Err(BudgetError::AllocationNotFound(_))));
}

#[tokio::test]
async fn test_shrinking_cycle_cannot_strand_allocations() {
    let store = store();
    let engine = engine(&store);
    let cycle = engine
        .create_budget_cycle(&manager(), cycle_input(2025, 4))
        .await
        .expect("create");
    engine
        .allocate_project(&manager(), allocation(&cycle, 2028, dec!(10)))
        .await
        .expect("allocate");

    let result = engine
        .update_budget_cycle(
            &manager(),
            cycle.id,
            UpdateBudgetCycleInput {
                duration_years: Some(3),
                ..UpdateBudgetCycleInput::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(BudgetError::StrandedAllocations { count: 1, end_year: 2027, .. })
    ));

    let renamed = engine
        .update_budget_cycle(
            &manager(),
            cycle.id,
            UpdateBudgetCycleInput {
                name: Some("FY25-28".into()),
                duration_years: Some(5),
                ..UpdateBudgetCycleInput::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(renamed.name, "FY25-28");
    assert_eq!(renamed.end_year, 2029);
}

#[tokio::test]
async fn test_bulk_delete_is_all_or_nothing() {
    let store = store();
    let engine = engine(&store);
    let cycle = engine
        .create_budget_cycle(&manager(), cycle_input(2025, 2))
        .await
        .expect("create");
    let mut ids = Vec::new();
    for _ in 0..3 {
        let created = engine
            .allocate_project(&manager(), allocation(&cycle, 2025, dec!(10)))
            .await
            .expect("allocate");
        ids.push(created.id);
    }
    let missing = AllocationId::new();
    let request = [ids[0], ids[1], missing, ids[2]];

    let outcome = engine
        .bulk_delete_allocations(&manager(), &request)
        .await
        .expect("bulk");

    assert!(!outcome.committed);
    let statuses: Vec<&BulkItemStatus> = outcome.items.iter().map(|i| &i.status).collect();
    assert_eq!(statuses[0], &BulkItemStatus::RolledBack);
    assert_eq!(statuses[1], &BulkItemStatus::RolledBack);
    assert!(matches!(statuses[2], BulkItemStatus::Failed(_)));
    assert_eq!(statuses[3], &BulkItemStatus::Skipped);
    assert_eq!(outcome.failed().count(), 1);
    assert_eq!(engine.list_allocations(cycle.id).await.expect("list").len(), 3);

    let outcome = engine
        .bulk_delete_allocations(&manager(), &ids)
        .await
        .expect("bulk");
    assert!(outcome.committed);
    assert_eq!(outcome.succeeded(), 3);
    assert!(engine.list_allocations(cycle.id).await.expect("list").is_empty());
}

#[tokio::test]
async fn test_bulk_archive_and_delete_cycles() {
    let store = store();
    let engine = engine(&store);
    let first = engine
        .create_budget_cycle(&manager(), cycle_input(2025, 2))
        .await
        .expect("create");
    let second = engine
        .create_budget_cycle(&manager(), cycle_input(2027, 2))
        .await
        .expect("create");

    let outcome = engine
        .bulk_archive_cycles(&manager(), &[first.id, second.id])
        .await
        .expect("archive");
    assert!(outcome.committed);
    assert!(engine.list_budget_cycles(false).await.expect("list").is_empty());
    assert_eq!(engine.list_budget_cycles(true).await.expect("list").len(), 2);

    let again = engine
        .bulk_archive_cycles(&manager(), &[first.id])
        .await
        .expect("archive again");
    assert!(!again.committed);

    let deleted = engine
        .bulk_delete_cycles(&manager(), &[first.id, second.id, first.id])
        .await
        .expect("delete");
    assert!(deleted.committed);
    let ids: Vec<BudgetCycleId> = deleted.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert_eq!(deleted.succeeded(), 2);
    assert!(engine.list_budget_cycles(true).await.expect("list").is_empty());
}

#[tokio::test]
async fn test_budget_mutations_require_manager() {
    let store = store();
    let engine = engine(&store);

    let result = engine.create_budget_cycle(&assessor(), cycle_input(2025, 2)).await;
    assert!(matches!(result, Err(BudgetError::PermissionDenied(_))));

    let bulk = engine.bulk_delete_cycles(&assessor(), &[]).await;
    assert!(matches!(bulk, Err(BudgetError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_allocate_from_ranking_places_in_rank_order() {
    let store = store();
    let criteria = seed_criteria(&store, &[("Risk", dec!(100))]).await;
    let scoring = ScoringEngine::new(Arc::clone(&store));
    let projects: Vec<ProjectId> = (0..4).map(|_| ProjectId::new()).collect();
    for (project, score) in projects.iter().zip([dec!(9), dec!(8), dec!(7)]) {
        scoring
            .score_project(&assessor(), *project, vec![ScoreInput::new(criteria[0].id, score, None)])
            .await
            .expect("score");
    }
    RankingService::new(Arc::clone(&store))
        .calculate_all_project_scores()
        .await
        .expect("rank");

    let engine = engine(&store);
    let mut input = cycle_input(2025, 2);
    input.total_budget = dec!(200_000);
    let cycle = engine.create_budget_cycle(&manager(), input).await.expect("create");

    let costs = BTreeMap::from([
        (projects[0], dec!(80_000)),
        (projects[1], dec!(50_000)),
        (projects[2], dec!(150_000)),
        (projects[3], dec!(1_000)),
    ]);
    let result = engine
        .allocate_from_ranking(&manager(), cycle.id, &costs)
        .await
        .expect("allocate");

    assert_eq!(result.allocations.len(), 2);
    assert_eq!(result.allocations[0].project_id, projects[0]);
    assert_eq!(result.allocations[0].year, 2025);
    assert_eq!(result.allocations[0].allocated_amount, dec!(80_000));
    assert_eq!(result.allocations[0].priority, Some(1));
    assert_eq!(result.allocations[1].project_id, projects[1]);
    assert_eq!(result.allocations[1].year, 2026);
    assert_eq!(result.allocations[1].allocated_amount, dec!(52_500));
    assert!(result
        .allocations
        .iter()
        .all(|a| a.status == AllocationStatus::Proposed));

    let reasons: Vec<(ProjectId, UnplacedReason)> = result
        .unplaced
        .iter()
        .map(|u| (u.project_id, u.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (projects[2], UnplacedReason::InsufficientCapacity),
            (projects[3], UnplacedReason::NotRanked),
        ]
    );
    assert_eq!(engine.list_allocations(cycle.id).await.expect("list").len(), 2);

    let rerun = engine
        .allocate_from_ranking(&manager(), cycle.id, &costs)
        .await
        .expect("rerun");
    assert!(rerun.allocations.is_empty());
    assert!(rerun
        .unplaced
        .iter()
        .any(|u| u.project_id == projects[0] && u.reason == UnplacedReason::AlreadyAllocated));
}

#[tokio::test]
async fn test_reads_fail_loudly_when_store_is_down() {
    let store = store();
    let engine = engine(&store);
    let cycle = engine
        .create_budget_cycle(&manager(), cycle_input(2025, 2))
        .await
        .expect("create");
    store.set_unavailable(true);

    let err = engine
        .get_budget_summary_by_year(cycle.id)
        .await
        .expect_err("store down");
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}
