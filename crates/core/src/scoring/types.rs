//! Scoring data types.

use std::fmt;

use chrono::{DateTime, Utc};
use keystone_shared::types::{CriterionId, ProjectId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::audit::ScoringAuditEntry;

/// Workflow state of a project score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    /// Editable by assessors.
    Draft,
    /// Handed in for review. Still editable.
    Submitted,
    /// Final. No further edits.
    Locked,
}

impl ScoreStatus {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Locked => "locked",
        }
    }

    /// Parses the canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "locked" => Some(Self::Locked),
            _ => None,
        }
    }

    /// The only status this one may advance to.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Draft => Some(Self::Submitted),
            Self::Submitted => Some(Self::Locked),
            Self::Locked => None,
        }
    }
}

impl fmt::Display for ScoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One assessor score for a (project, criterion) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectScore {
    /// Project.
    pub project_id: ProjectId,
    /// Criterion.
    pub criteria_id: CriterionId,
    /// Score on the 0–10 scale.
    pub score: Decimal,
    /// Assessor's reasoning.
    pub justification: Option<String>,
    /// Workflow state.
    pub status: ScoreStatus,
    /// Last user to write the score.
    pub scored_by: UserId,
    /// First write.
    pub created_at: DateTime<Utc>,
    /// Last write.
    pub updated_at: DateTime<Utc>,
}

/// One entry of a `score_project` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreInput {
    /// Criterion being scored.
    pub criteria_id: CriterionId,
    /// Score on the 0–10 scale.
    pub score: Decimal,
    /// Assessor's reasoning.
    pub justification: Option<String>,
}

impl ScoreInput {
    /// Convenience constructor.
    #[must_use]
    pub fn new(criteria_id: CriterionId, score: Decimal, justification: Option<&str>) -> Self {
        Self {
            criteria_id,
            score,
            justification: justification.map(ToString::to_string),
        }
    }
}

/// Score rows and their audit rows, written together.
#[derive(Debug, Clone, Default)]
pub struct ScoreCommit {
    /// Rows to insert or overwrite, keyed by (project, criterion).
    pub upserts: Vec<ProjectScore>,
    /// Audit rows.
    pub audit: Vec<ScoringAuditEntry>,
}

impl ScoreCommit {
    /// Whether the commit changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty()
    }
}

/// A scored criterion's share of a composite score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionContribution {
    /// Criterion.
    pub criteria_id: CriterionId,
    /// Weight used.
    pub weight: Decimal,
    /// Score used.
    pub score: Decimal,
    /// `score * weight`.
    pub weighted: Decimal,
}

/// Weighted composite of a project's scores on the 0–100 scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Project.
    pub project_id: ProjectId,
    /// Composite score, two decimals, within 0–100.
    pub composite: Decimal,
    /// Sum of the weights of scored criteria.
    pub scored_weight: Decimal,
    /// Number of weighted criteria the project has a score for.
    pub scored_criteria: usize,
    /// Number of weighted criteria considered.
    pub total_criteria: usize,
    /// Per-criterion breakdown, in weight order.
    pub contributions: Vec<CriterionContribution>,
}

/// Scoring completeness for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringProgress {
    /// Active criteria.
    pub total_criteria: usize,
    /// Active criteria with a score.
    pub scored_criteria: usize,
    /// Active criteria without a score.
    pub unscored_criteria: usize,
    /// Scores in draft.
    pub draft: usize,
    /// Scores submitted.
    pub submitted: usize,
    /// Scores locked.
    pub locked: usize,
    /// `scored / total * 100`, two decimals.
    pub completion_percent: Decimal,
}
