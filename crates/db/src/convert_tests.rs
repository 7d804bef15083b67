use super::*;
use chrono::TimeZone;
use rstest::rstest;
use rust_decimal_macros::dec;
use sea_orm::{ActiveValue, RuntimeErr};
use uuid::Uuid;

fn timestamp() -> DateTimeWithTimeZone {
    to_db(Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap())
}

fn criterion_model(category: &str, lifecycle: &str) -> criteria::Model {
    criteria::Model {
        id: Uuid::now_v7(),
        name: "Life Safety & Risk".to_string(),
        description: None,
        category: category.to_string(),
        weight: dec!(25.00),
        scoring_guideline: Some("10 = imminent hazard".to_string()),
        lifecycle: lifecycle.to_string(),
        display_order: 1,
        model_version_id: None,
        created_by: Uuid::now_v7(),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

#[rstest]
#[case("risk", "active", CriterionCategory::Risk, CriterionLifecycle::Active)]
#[case("environmental", "inactive", CriterionCategory::Environmental, CriterionLifecycle::Inactive)]
#[case(
    "compliance",
    "permanently_deleted",
    CriterionCategory::Compliance,
    CriterionLifecycle::PermanentlyDeleted
)]
fn test_criterion_enums_parse(
    #[case] category: &str,
    #[case] lifecycle: &str,
    #[case] expected_category: CriterionCategory,
    #[case] expected_lifecycle: CriterionLifecycle,
) {
    let criterion = criterion_from_model(criterion_model(category, lifecycle)).unwrap();
    assert_eq!(criterion.category, expected_category);
    assert_eq!(criterion.lifecycle, expected_lifecycle);
}

#[test]
fn test_unknown_category_is_backend_error() {
    let err = criterion_from_model(criterion_model("aesthetic", "active")).unwrap_err();
    assert!(matches!(err, StoreError::Backend(ref msg) if msg.contains("aesthetic")));
}

#[test]
fn test_criterion_active_model_keeps_weight_and_strings() {
    let criterion = criterion_from_model(criterion_model("strategic", "active")).unwrap();
    let active = criterion_to_active(&criterion);

    assert_eq!(active.weight, ActiveValue::Set(dec!(25.00)));
    assert_eq!(active.category, ActiveValue::Set("strategic".to_string()));
    assert_eq!(active.lifecycle, ActiveValue::Set("active".to_string()));
    assert_eq!(active.created_at, ActiveValue::Set(timestamp()));
}

#[test]
fn test_score_keeps_exact_decimal() {
    let model = project_scores::Model {
        project_id: Uuid::now_v7(),
        criteria_id: Uuid::now_v7(),
        score: dec!(7.35),
        justification: Some("Roof membrane at end of life".to_string()),
        status: "submitted".to_string(),
        scored_by: Uuid::now_v7(),
        created_at: timestamp(),
        updated_at: timestamp(),
    };

    let score = score_from_model(model).unwrap();
    assert_eq!(score.score, dec!(7.35));
    assert_eq!(score.status, ScoreStatus::Submitted);
    assert_eq!(score_to_active(&score).score, ActiveValue::Set(dec!(7.35)));
}

#[test]
fn test_negative_rank_rejected() {
    let model = ranking_cache::Model {
        project_id: Uuid::now_v7(),
        composite_score: dec!(80.00),
        rank: -1,
        scored_criteria: 2,
    };

    assert!(matches!(ranking_from_model(model), Err(StoreError::Backend(_))));
}

#[test]
fn test_scoring_audit_optional_status() {
    let model = scoring_audit_log::Model {
        id: Uuid::now_v7(),
        project_id: Uuid::now_v7(),
        criteria_id: Uuid::now_v7(),
        action: "scored".to_string(),
        old_score: None,
        new_score: Some(dec!(6)),
        old_justification: None,
        new_justification: None,
        old_status: None,
        new_status: Some("draft".to_string()),
        changed_by: Uuid::now_v7(),
        changed_at: timestamp(),
    };

    let entry = scoring_audit_from_model(model).unwrap();
    assert_eq!(entry.action, ScoringAuditAction::Scored);
    assert_eq!(entry.old_status, None);
    assert_eq!(entry.new_status, Some(ScoreStatus::Draft));
}

#[test]
fn test_funding_constraints_json() {
    let cycle = BudgetCycle {
        id: BudgetCycleId::new(),
        name: "FY25-29 Capital Plan".to_string(),
        description: None,
        start_year: 2025,
        duration_years: 5,
        end_year: 2029,
        total_budget: dec!(5000000),
        inflation_rate: dec!(3),
        escalation_rate: dec!(2.5),
        funding_constraints: vec![FundingConstraint {
            year: 2026,
            max_amount: dec!(1200000.50),
        }],
        status: CycleStatus::Planning,
        created_by: UserId::new(),
        created_at: to_utc(timestamp()),
        updated_at: to_utc(timestamp()),
    };

    let active = cycle_to_active(&cycle).unwrap();
    let ActiveValue::Set(json) = active.funding_constraints else {
        panic!("funding_constraints not set");
    };

    let model = budget_cycles::Model {
        id: cycle.id.into_inner(),
        name: cycle.name.clone(),
        description: None,
        start_year: 2025,
        duration_years: 5,
        end_year: 2029,
        total_budget: cycle.total_budget,
        inflation_rate: cycle.inflation_rate,
        escalation_rate: cycle.escalation_rate,
        funding_constraints: json,
        status: "planning".to_string(),
        created_by: cycle.created_by.into_inner(),
        created_at: timestamp(),
        updated_at: timestamp(),
    };

    assert_eq!(cycle_from_model(model).unwrap(), cycle);
}

#[test]
fn test_malformed_funding_constraints() {
    let model = budget_cycles::Model {
        id: Uuid::now_v7(),
        name: "Broken".to_string(),
        description: None,
        start_year: 2025,
        duration_years: 1,
        end_year: 2025,
        total_budget: dec!(0),
        inflation_rate: dec!(0),
        escalation_rate: dec!(0),
        funding_constraints: serde_json::json!({"year": 2025}),
        status: "planning".to_string(),
        created_by: Uuid::now_v7(),
        created_at: timestamp(),
        updated_at: timestamp(),
    };

    assert!(matches!(cycle_from_model(model), Err(StoreError::Backend(_))));
}

#[rstest]
#[case("planned", GreenUpgradeStatus::Planned)]
#[case("in_progress", GreenUpgradeStatus::InProgress)]
#[case("cancelled", GreenUpgradeStatus::Cancelled)]
fn test_green_upgrade_status(#[case] raw: &str, #[case] expected: GreenUpgradeStatus) {
    let model = green_upgrades::Model {
        id: Uuid::now_v7(),
        project_id: Uuid::now_v7(),
        name: "Chiller replacement".to_string(),
        status: raw.to_string(),
        energy_savings_kwh: dec!(120000),
        water_savings_gallons: dec!(0),
        ghg_reduction_tonnes: dec!(45.5),
        created_at: timestamp(),
        updated_at: timestamp(),
    };

    let upgrade = green_upgrade_from_model(model).unwrap();
    assert_eq!(upgrade.status, expected);
    assert_eq!(upgrade.ghg_reduction_tonnes, dec!(45.5));
}

#[test]
fn test_connection_errors_are_unavailable() {
    let err = store_error(DbErr::Conn(RuntimeErr::Internal("refused".to_string())));
    assert!(err.is_transient());

    let err = store_error(DbErr::Custom("constraint violated".to_string()));
    assert!(matches!(err, StoreError::Backend(_)));
}
