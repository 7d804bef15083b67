//! Audit log row types.
//!
//! Rows are created alongside the mutation they describe and are never
//! updated or deleted afterwards.

use chrono::{DateTime, Utc};
use keystone_shared::types::{AuditEntryId, CriterionId, ProjectId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::criteria::CriterionLifecycle;
use crate::scoring::ScoreStatus;

/// What happened to a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaAuditAction {
    /// Criterion created.
    Created,
    /// Name, description, category, weight or guideline edited.
    Updated,
    /// Soft-deleted.
    Deactivated,
    /// Restored after a soft delete.
    Reactivated,
    /// Tombstoned and its scores purged.
    PermanentlyDeleted,
    /// Weight rescaled by normalization.
    WeightNormalized,
    /// Re-tagged to a new model version.
    ModelVersionTagged,
}

impl CriteriaAuditAction {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deactivated => "deactivated",
            Self::Reactivated => "reactivated",
            Self::PermanentlyDeleted => "permanently_deleted",
            Self::WeightNormalized => "weight_normalized",
            Self::ModelVersionTagged => "model_version_tagged",
        }
    }

    /// Parses the canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "deactivated" => Some(Self::Deactivated),
            "reactivated" => Some(Self::Reactivated),
            "permanently_deleted" => Some(Self::PermanentlyDeleted),
            "weight_normalized" => Some(Self::WeightNormalized),
            "model_version_tagged" => Some(Self::ModelVersionTagged),
            _ => None,
        }
    }
}

/// What happened to a project score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringAuditAction {
    /// First score for the (project, criterion) cell.
    Scored,
    /// Existing score overwritten.
    Rescored,
    /// Workflow status advanced.
    StatusChanged,
}

impl ScoringAuditAction {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scored => "scored",
            Self::Rescored => "rescored",
            Self::StatusChanged => "status_changed",
        }
    }

    /// Parses the canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scored" => Some(Self::Scored),
            "rescored" => Some(Self::Rescored),
            "status_changed" => Some(Self::StatusChanged),
            _ => None,
        }
    }
}

/// Criteria audit log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaAuditEntry {
    /// Row ID.
    pub id: AuditEntryId,
    /// Criterion the change applies to.
    pub criteria_id: CriterionId,
    /// Kind of change.
    pub action: CriteriaAuditAction,
    /// Name before the change.
    pub old_name: Option<String>,
    /// Name after the change.
    pub new_name: Option<String>,
    /// Weight before the change.
    pub old_weight: Option<Decimal>,
    /// Weight after the change.
    pub new_weight: Option<Decimal>,
    /// Lifecycle before the change.
    pub old_lifecycle: Option<CriterionLifecycle>,
    /// Lifecycle after the change.
    pub new_lifecycle: Option<CriterionLifecycle>,
    /// Who made the change.
    pub changed_by: UserId,
    /// When.
    pub changed_at: DateTime<Utc>,
}

/// Scoring audit log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringAuditEntry {
    /// Row ID.
    pub id: AuditEntryId,
    /// Project scored.
    pub project_id: ProjectId,
    /// Criterion scored.
    pub criteria_id: CriterionId,
    /// Kind of change.
    pub action: ScoringAuditAction,
    /// Score before the change.
    pub old_score: Option<Decimal>,
    /// Score after the change.
    pub new_score: Option<Decimal>,
    /// Justification before the change.
    pub old_justification: Option<String>,
    /// Justification after the change.
    pub new_justification: Option<String>,
    /// Status before the change.
    pub old_status: Option<ScoreStatus>,
    /// Status after the change.
    pub new_status: Option<ScoreStatus>,
    /// Who made the change.
    pub changed_by: UserId,
    /// When.
    pub changed_at: DateTime<Utc>,
}

/// One row of the merged activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AuditActivity {
    /// Criteria change.
    Criteria(CriteriaAuditEntry),
    /// Scoring change.
    Scoring(ScoringAuditEntry),
}

impl AuditActivity {
    /// Timestamp of the underlying row.
    #[must_use]
    pub fn changed_at(&self) -> DateTime<Utc> {
        match self {
            Self::Criteria(entry) => entry.changed_at,
            Self::Scoring(entry) => entry.changed_at,
        }
    }

    /// Actor of the underlying row.
    #[must_use]
    pub fn changed_by(&self) -> UserId {
        match self {
            Self::Criteria(entry) => entry.changed_by,
            Self::Scoring(entry) => entry.changed_by,
        }
    }
}
