//! Row and domain conversions.
//!
//! Enumerations are stored as their canonical strings; a value the domain does
//! not recognize is reported as a backend error rather than silently mapped.

use chrono::{DateTime, Utc};
use keystone_core::audit::{
    CriteriaAuditAction, CriteriaAuditEntry, ScoringAuditAction, ScoringAuditEntry,
};
use keystone_core::budget::{
    AllocationStatus, BudgetAllocation, BudgetCycle, CycleStatus, FundingConstraint,
};
use keystone_core::criteria::{Criterion, CriterionCategory, CriterionLifecycle, ModelVersion};
use keystone_core::environmental::{GreenUpgrade, GreenUpgradeStatus};
use keystone_core::ranking::RankingEntry;
use keystone_core::scoring::{ProjectScore, ScoreStatus};
use keystone_core::StoreError;
use keystone_shared::types::{
    AllocationId, AuditEntryId, BudgetCycleId, CriterionId, GreenUpgradeId, ModelVersionId,
    ProjectId, UserId,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{DbErr, Set};

use crate::entities::{
    budget_allocations, budget_cycles, criteria, criteria_audit_log, green_upgrades,
    model_versions, project_scores, ranking_cache, scoring_audit_log,
};

// ============================================================================
// Errors and scalars
// ============================================================================

/// Maps a database error onto the store taxonomy.
pub(crate) fn store_error(err: DbErr) -> StoreError {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => StoreError::unavailable(err.to_string()),
        other => StoreError::backend(other.to_string()),
    }
}

fn parse_enum<T>(
    column: &'static str,
    value: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, StoreError> {
    parse(value).ok_or_else(|| StoreError::backend(format!("unknown {column} value: {value}")))
}

fn parse_opt_enum<T>(
    column: &'static str,
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, StoreError> {
    value.map(|v| parse_enum(column, v, parse)).transpose()
}

pub(crate) fn to_utc(value: DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

pub(crate) fn to_db(value: DateTime<Utc>) -> DateTimeWithTimeZone {
    value.into()
}

fn to_i32(column: &'static str, value: u32) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::backend(format!("{column} out of range: {value}")))
}

fn to_u32(column: &'static str, value: i32) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::backend(format!("{column} out of range: {value}")))
}

// ============================================================================
// Criteria
// ============================================================================

pub(crate) fn criterion_from_model(model: criteria::Model) -> Result<Criterion, StoreError> {
    Ok(Criterion {
        id: CriterionId::from_uuid(model.id),
        category: parse_enum("category", &model.category, CriterionCategory::parse)?,
        lifecycle: parse_enum("lifecycle", &model.lifecycle, CriterionLifecycle::parse)?,
        name: model.name,
        description: model.description,
        weight: model.weight,
        scoring_guideline: model.scoring_guideline,
        display_order: model.display_order,
        model_version_id: model.model_version_id.map(ModelVersionId::from_uuid),
        created_by: UserId::from_uuid(model.created_by),
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}

pub(crate) fn criterion_to_active(criterion: &Criterion) -> criteria::ActiveModel {
    criteria::ActiveModel {
        id: Set(criterion.id.into_inner()),
        name: Set(criterion.name.clone()),
        description: Set(criterion.description.clone()),
        category: Set(criterion.category.as_str().to_string()),
        weight: Set(criterion.weight),
        scoring_guideline: Set(criterion.scoring_guideline.clone()),
        lifecycle: Set(criterion.lifecycle.as_str().to_string()),
        display_order: Set(criterion.display_order),
        model_version_id: Set(criterion.model_version_id.map(ModelVersionId::into_inner)),
        created_by: Set(criterion.created_by.into_inner()),
        created_at: Set(to_db(criterion.created_at)),
        updated_at: Set(to_db(criterion.updated_at)),
    }
}

pub(crate) fn model_version_from_model(model: model_versions::Model) -> ModelVersion {
    ModelVersion {
        id: ModelVersionId::from_uuid(model.id),
        name: model.name,
        description: model.description,
        is_active: model.is_active,
        created_by: UserId::from_uuid(model.created_by),
        created_at: to_utc(model.created_at),
    }
}

pub(crate) fn model_version_to_active(version: &ModelVersion) -> model_versions::ActiveModel {
    model_versions::ActiveModel {
        id: Set(version.id.into_inner()),
        name: Set(version.name.clone()),
        description: Set(version.description.clone()),
        is_active: Set(version.is_active),
        created_by: Set(version.created_by.into_inner()),
        created_at: Set(to_db(version.created_at)),
    }
}

// ============================================================================
// Scores
// ============================================================================

pub(crate) fn score_from_model(model: project_scores::Model) -> Result<ProjectScore, StoreError> {
    Ok(ProjectScore {
        project_id: ProjectId::from_uuid(model.project_id),
        criteria_id: CriterionId::from_uuid(model.criteria_id),
        score: model.score,
        justification: model.justification,
        status: parse_enum("status", &model.status, ScoreStatus::parse)?,
        scored_by: UserId::from_uuid(model.scored_by),
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}

pub(crate) fn score_to_active(score: &ProjectScore) -> project_scores::ActiveModel {
    project_scores::ActiveModel {
        project_id: Set(score.project_id.into_inner()),
        criteria_id: Set(score.criteria_id.into_inner()),
        score: Set(score.score),
        justification: Set(score.justification.clone()),
        status: Set(score.status.as_str().to_string()),
        scored_by: Set(score.scored_by.into_inner()),
        created_at: Set(to_db(score.created_at)),
        updated_at: Set(to_db(score.updated_at)),
    }
}

// ============================================================================
// Ranking
// ============================================================================

pub(crate) fn ranking_from_model(model: ranking_cache::Model) -> Result<RankingEntry, StoreError> {
    Ok(RankingEntry {
        project_id: ProjectId::from_uuid(model.project_id),
        composite_score: model.composite_score,
        rank: to_u32("rank", model.rank)?,
        scored_criteria: to_u32("scored_criteria", model.scored_criteria)?,
    })
}

pub(crate) fn ranking_to_active(entry: &RankingEntry) -> Result<ranking_cache::ActiveModel, StoreError> {
    Ok(ranking_cache::ActiveModel {
        project_id: Set(entry.project_id.into_inner()),
        composite_score: Set(entry.composite_score),
        rank: Set(to_i32("rank", entry.rank)?),
        scored_criteria: Set(to_i32("scored_criteria", entry.scored_criteria)?),
    })
}

// ============================================================================
// Audit
// ============================================================================

pub(crate) fn criteria_audit_from_model(
    model: criteria_audit_log::Model,
) -> Result<CriteriaAuditEntry, StoreError> {
    Ok(CriteriaAuditEntry {
        id: AuditEntryId::from_uuid(model.id),
        criteria_id: CriterionId::from_uuid(model.criteria_id),
        action: parse_enum("action", &model.action, CriteriaAuditAction::parse)?,
        old_lifecycle: parse_opt_enum(
            "old_lifecycle",
            model.old_lifecycle.as_deref(),
            CriterionLifecycle::parse,
        )?,
        new_lifecycle: parse_opt_enum(
            "new_lifecycle",
            model.new_lifecycle.as_deref(),
            CriterionLifecycle::parse,
        )?,
        old_name: model.old_name,
        new_name: model.new_name,
        old_weight: model.old_weight,
        new_weight: model.new_weight,
        changed_by: UserId::from_uuid(model.changed_by),
        changed_at: to_utc(model.changed_at),
    })
}

pub(crate) fn criteria_audit_to_active(entry: &CriteriaAuditEntry) -> criteria_audit_log::ActiveModel {
    criteria_audit_log::ActiveModel {
        id: Set(entry.id.into_inner()),
        criteria_id: Set(entry.criteria_id.into_inner()),
        action: Set(entry.action.as_str().to_string()),
        old_name: Set(entry.old_name.clone()),
        new_name: Set(entry.new_name.clone()),
        old_weight: Set(entry.old_weight),
        new_weight: Set(entry.new_weight),
        old_lifecycle: Set(entry.old_lifecycle.map(|l| l.as_str().to_string())),
        new_lifecycle: Set(entry.new_lifecycle.map(|l| l.as_str().to_string())),
        changed_by: Set(entry.changed_by.into_inner()),
        changed_at: Set(to_db(entry.changed_at)),
    }
}

pub(crate) fn scoring_audit_from_model(
    model: scoring_audit_log::Model,
) -> Result<ScoringAuditEntry, StoreError> {
    Ok(ScoringAuditEntry {
        id: AuditEntryId::from_uuid(model.id),
        project_id: ProjectId::from_uuid(model.project_id),
        criteria_id: CriterionId::from_uuid(model.criteria_id),
        action: parse_enum("action", &model.action, ScoringAuditAction::parse)?,
        old_status: parse_opt_enum("old_status", model.old_status.as_deref(), ScoreStatus::parse)?,
        new_status: parse_opt_enum("new_status", model.new_status.as_deref(), ScoreStatus::parse)?,
        old_score: model.old_score,
        new_score: model.new_score,
        old_justification: model.old_justification,
        new_justification: model.new_justification,
        changed_by: UserId::from_uuid(model.changed_by),
        changed_at: to_utc(model.changed_at),
    })
}

pub(crate) fn scoring_audit_to_active(entry: &ScoringAuditEntry) -> scoring_audit_log::ActiveModel {
    scoring_audit_log::ActiveModel {
        id: Set(entry.id.into_inner()),
        project_id: Set(entry.project_id.into_inner()),
        criteria_id: Set(entry.criteria_id.into_inner()),
        action: Set(entry.action.as_str().to_string()),
        old_score: Set(entry.old_score),
        new_score: Set(entry.new_score),
        old_justification: Set(entry.old_justification.clone()),
        new_justification: Set(entry.new_justification.clone()),
        old_status: Set(entry.old_status.map(|s| s.as_str().to_string())),
        new_status: Set(entry.new_status.map(|s| s.as_str().to_string())),
        changed_by: Set(entry.changed_by.into_inner()),
        changed_at: Set(to_db(entry.changed_at)),
    }
}

// ============================================================================
// Budget
// ============================================================================

pub(crate) fn cycle_from_model(model: budget_cycles::Model) -> Result<BudgetCycle, StoreError> {
    let funding_constraints: Vec<FundingConstraint> =
        serde_json::from_value(model.funding_constraints)
            .map_err(|e| StoreError::backend(format!("invalid funding_constraints: {e}")))?;

    Ok(BudgetCycle {
        id: BudgetCycleId::from_uuid(model.id),
        status: parse_enum("status", &model.status, CycleStatus::parse)?,
        name: model.name,
        description: model.description,
        start_year: model.start_year,
        duration_years: model.duration_years,
        end_year: model.end_year,
        total_budget: model.total_budget,
        inflation_rate: model.inflation_rate,
        escalation_rate: model.escalation_rate,
        funding_constraints,
        created_by: UserId::from_uuid(model.created_by),
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}

pub(crate) fn cycle_to_active(cycle: &BudgetCycle) -> Result<budget_cycles::ActiveModel, StoreError> {
    let funding_constraints = serde_json::to_value(&cycle.funding_constraints)
        .map_err(|e| StoreError::backend(format!("invalid funding_constraints: {e}")))?;

    Ok(budget_cycles::ActiveModel {
        id: Set(cycle.id.into_inner()),
        name: Set(cycle.name.clone()),
        description: Set(cycle.description.clone()),
        start_year: Set(cycle.start_year),
        duration_years: Set(cycle.duration_years),
        end_year: Set(cycle.end_year),
        total_budget: Set(cycle.total_budget),
        inflation_rate: Set(cycle.inflation_rate),
        escalation_rate: Set(cycle.escalation_rate),
        funding_constraints: Set(funding_constraints),
        status: Set(cycle.status.as_str().to_string()),
        created_by: Set(cycle.created_by.into_inner()),
        created_at: Set(to_db(cycle.created_at)),
        updated_at: Set(to_db(cycle.updated_at)),
    })
}

pub(crate) fn allocation_from_model(
    model: budget_allocations::Model,
) -> Result<BudgetAllocation, StoreError> {
    Ok(BudgetAllocation {
        id: AllocationId::from_uuid(model.id),
        cycle_id: BudgetCycleId::from_uuid(model.cycle_id),
        project_id: ProjectId::from_uuid(model.project_id),
        status: parse_enum("status", &model.status, AllocationStatus::parse)?,
        year: model.year,
        allocated_amount: model.allocated_amount,
        priority: model.priority,
        justification: model.justification,
        created_by: UserId::from_uuid(model.created_by),
        created_at: to_utc(model.created_at),
        updated_at: to_utc(model.updated_at),
    })
}

pub(crate) fn allocation_to_active(allocation: &BudgetAllocation) -> budget_allocations::ActiveModel {
    budget_allocations::ActiveModel {
        id: Set(allocation.id.into_inner()),
        cycle_id: Set(allocation.cycle_id.into_inner()),
        project_id: Set(allocation.project_id.into_inner()),
        year: Set(allocation.year),
        allocated_amount: Set(allocation.allocated_amount),
        priority: Set(allocation.priority),
        justification: Set(allocation.justification.clone()),
        status: Set(allocation.status.as_str().to_string()),
        created_by: Set(allocation.created_by.into_inner()),
        created_at: Set(to_db(allocation.created_at)),
        updated_at: Set(to_db(allocation.updated_at)),
    }
}

// ============================================================================
// Green upgrades
// ============================================================================

pub(crate) fn green_upgrade_from_model(
    model: green_upgrades::Model,
) -> Result<GreenUpgrade, StoreError> {
    Ok(GreenUpgrade {
        id: GreenUpgradeId::from_uuid(model.id),
        project_id: ProjectId::from_uuid(model.project_id),
        status: parse_enum("status", &model.status, GreenUpgradeStatus::parse)?,
        name: model.name,
        energy_savings_kwh: model.energy_savings_kwh,
        water_savings_gallons: model.water_savings_gallons,
        ghg_reduction_tonnes: model.ghg_reduction_tonnes,
    })
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;
