//! Criteria data types.

use std::fmt;

use chrono::{DateTime, Utc};
use keystone_shared::types::{CriterionId, ModelVersionId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::audit::CriteriaAuditEntry;

/// Criterion category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionCategory {
    /// Life-safety and failure risk.
    Risk,
    /// Alignment with strategic plans.
    Strategic,
    /// Code and regulatory compliance.
    Compliance,
    /// Cost avoidance and return.
    Financial,
    /// Impact on building operations.
    Operational,
    /// Energy, water and emissions.
    Environmental,
}

impl CriterionCategory {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Strategic => "strategic",
            Self::Compliance => "compliance",
            Self::Financial => "financial",
            Self::Operational => "operational",
            Self::Environmental => "environmental",
        }
    }

    /// Parses the canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "risk" => Some(Self::Risk),
            "strategic" => Some(Self::Strategic),
            "compliance" => Some(Self::Compliance),
            "financial" => Some(Self::Financial),
            "operational" => Some(Self::Operational),
            "environmental" => Some(Self::Environmental),
            _ => None,
        }
    }
}

impl fmt::Display for CriterionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Criterion lifecycle.
///
/// `Inactive` is reversible through reactivation; `PermanentlyDeleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionLifecycle {
    /// Participates in normalization and scoring.
    Active,
    /// Soft-deleted.
    Inactive,
    /// Tombstone. Scores purged, never reactivated.
    PermanentlyDeleted,
}

impl CriterionLifecycle {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::PermanentlyDeleted => "permanently_deleted",
        }
    }

    /// Parses the canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "permanently_deleted" => Some(Self::PermanentlyDeleted),
            _ => None,
        }
    }
}

impl fmt::Display for CriterionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A weighted scoring criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Criterion ID.
    pub id: CriterionId,
    /// Display name, unique (case-insensitive) among active criteria.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Category.
    pub category: CriterionCategory,
    /// Weight in percentage points, two decimals.
    pub weight: Decimal,
    /// Guidance for assessors.
    pub scoring_guideline: Option<String>,
    /// Lifecycle state.
    pub lifecycle: CriterionLifecycle,
    /// Sort key for display.
    pub display_order: i32,
    /// Model version the criterion was last tagged with.
    pub model_version_id: Option<ModelVersionId>,
    /// User who created the criterion.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Criterion {
    /// Whether the criterion participates in normalization and scoring.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifecycle == CriterionLifecycle::Active
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

/// A named snapshot of the live criteria set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Version ID.
    pub id: ModelVersionId,
    /// Version name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Whether this is the live version. At most one is.
    pub is_active: bool,
    /// User who created the version.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a criterion.
#[derive(Debug, Clone)]
pub struct CreateCriterionInput {
    /// Name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Category.
    pub category: CriterionCategory,
    /// Requested weight before normalization.
    pub weight: Decimal,
    /// Guidance for assessors.
    pub scoring_guideline: Option<String>,
    /// Display order; appended after the last criterion when absent.
    pub display_order: Option<i32>,
}

/// Input for updating a criterion. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateCriterionInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New category.
    pub category: Option<CriterionCategory>,
    /// New requested weight.
    pub weight: Option<Decimal>,
    /// New guideline.
    pub scoring_guideline: Option<Option<String>>,
    /// New display order.
    pub display_order: Option<i32>,
}

/// Result of checking the weight invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightValidation {
    /// Sum of active weights.
    pub total: Decimal,
    /// Number of active criteria.
    pub active_count: usize,
    /// Whether the sum is within tolerance of 100 (or there are no active criteria).
    pub is_valid: bool,
}

/// Everything a criteria mutation needs to read, at one revision.
#[derive(Debug, Clone, Default)]
pub struct CriteriaSnapshot {
    /// Criteria revision the snapshot was read at.
    pub revision: i64,
    /// All criteria including inactive ones and tombstones.
    pub criteria: Vec<Criterion>,
    /// All model versions.
    pub model_versions: Vec<ModelVersion>,
}

impl CriteriaSnapshot {
    /// Active criteria in display order.
    #[must_use]
    pub fn active(&self) -> Vec<&Criterion> {
        let mut active: Vec<&Criterion> = self.criteria.iter().filter(|c| c.is_active()).collect();
        active.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.id.cmp(&b.id))
        });
        active
    }

    /// Looks up a criterion by ID, tombstones included.
    #[must_use]
    pub fn find(&self, id: CriterionId) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.id == id)
    }

    /// The live model version, if any.
    #[must_use]
    pub fn active_model_version(&self) -> Option<&ModelVersion> {
        self.model_versions.iter().find(|v| v.is_active)
    }
}

/// An atomic criteria write: changed rows, audit rows and an optional new model version.
///
/// The store applies it only if its criteria revision still equals
/// `expected_revision`, then bumps the revision.
#[derive(Debug, Clone, Default)]
pub struct CriteriaCommit {
    /// Revision the commit was planned against.
    pub expected_revision: i64,
    /// Inserted or updated criteria.
    pub upserts: Vec<Criterion>,
    /// Criteria whose project scores must be deleted.
    pub purge_scores_for: Vec<CriterionId>,
    /// New live model version; every other version is deactivated.
    pub activate_model_version: Option<ModelVersion>,
    /// Audit rows.
    pub audit: Vec<CriteriaAuditEntry>,
}

impl CriteriaCommit {
    /// Whether the commit changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty()
            && self.purge_scores_for.is_empty()
            && self.activate_model_version.is_none()
    }
}
