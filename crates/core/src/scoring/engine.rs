//! Scoring engine: per-project scores, status workflow and composites.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use keystone_shared::types::{Actor, AuditEntryId, CriterionId, ProjectId};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::composite::CompositeCalculator;
use super::error::ScoringError;
use super::types::{CompositeScore, ProjectScore, ScoreCommit, ScoreInput, ScoreStatus, ScoringProgress};
use super::workflow::ScoreWorkflow;
use crate::audit::{ScoringAuditAction, ScoringAuditEntry};
use crate::criteria::CriteriaRepository;
use crate::store::StoreError;

/// Upper bound of the per-criterion score scale.
pub const MAX_SCORE: Decimal = Decimal::TEN;

/// Repository trait for project score persistence.
pub trait ScoreRepository: Send + Sync {
    /// Scores recorded for one project.
    fn list_project_scores(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<ProjectScore>, StoreError>> + Send;

    /// Every recorded score.
    fn list_all_scores(&self) -> impl Future<Output = Result<Vec<ProjectScore>, StoreError>> + Send;

    /// Upserts score rows keyed by (project, criterion) and appends the audit rows,
    /// in one transaction. Bumps the score revision.
    fn commit_scores(&self, commit: ScoreCommit) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Scoring engine service.
pub struct ScoringEngine<R> {
    repo: Arc<R>,
}

impl<R> Clone for ScoringEngine<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: CriteriaRepository + ScoreRepository> ScoringEngine<R> {
    /// Create a new scoring engine.
    #[must_use]
    pub const fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Records scores for a project.
    ///
    /// New rows start as draft; rescoring keeps the row's status. The whole
    /// request is rejected if any entry is invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The actor may not score
    /// - A score is outside 0–10
    /// - A criterion is not active or appears twice
    /// - A targeted row is locked
    pub async fn score_project(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        inputs: Vec<ScoreInput>,
    ) -> Result<Vec<ProjectScore>, ScoringError> {
        if !actor.can_score() {
            return Err(ScoringError::PermissionDenied("score projects"));
        }
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let snapshot = self.repo.load_criteria().await?;
        let active: HashSet<CriterionId> = snapshot.active().iter().map(|c| c.id).collect();
        let mut seen = HashSet::new();
        for input in &inputs {
            if !seen.insert(input.criteria_id) {
                return Err(ScoringError::DuplicateCriterion(input.criteria_id));
            }
            if input.score < Decimal::ZERO || input.score > MAX_SCORE {
                return Err(ScoringError::ScoreOutOfRange {
                    criteria_id: input.criteria_id,
                    score: input.score,
                });
            }
            if !active.contains(&input.criteria_id) {
                return Err(ScoringError::InactiveCriterion(input.criteria_id));
            }
        }

        let existing: HashMap<CriterionId, ProjectScore> = self
            .repo
            .list_project_scores(project_id)
            .await?
            .into_iter()
            .map(|s| (s.criteria_id, s))
            .collect();

        let now = Utc::now();
        let mut commit = ScoreCommit::default();
        for input in inputs {
            let before = existing.get(&input.criteria_id);
            let status = ScoreWorkflow::status_after_rescore(before.map(|s| s.status), input.criteria_id)?;
            let row = ProjectScore {
                project_id,
                criteria_id: input.criteria_id,
                score: input.score,
                justification: input.justification,
                status,
                scored_by: actor.user_id,
                created_at: before.map_or(now, |s| s.created_at),
                updated_at: now,
            };
            let action = if before.is_some() {
                ScoringAuditAction::Rescored
            } else {
                ScoringAuditAction::Scored
            };
            commit.audit.push(audit_row(action, before, &row, actor, now));
            commit.upserts.push(row);
        }

        let written = commit.upserts.clone();
        self.repo.commit_scores(commit).await?;
        info!(project_id = %project_id, count = written.len(), actor = %actor.user_id, "Project scored");
        Ok(written)
    }

    /// Scores recorded for a project, in criterion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_project_scores(&self, project_id: ProjectId) -> Result<Vec<ProjectScore>, ScoringError> {
        let mut scores = self.repo.list_project_scores(project_id).await?;
        scores.sort_by_key(|s| s.criteria_id);
        Ok(scores)
    }

    /// Composite score of a project under the current active weights.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn calculate_composite_score(&self, project_id: ProjectId) -> Result<CompositeScore, ScoringError> {
        let snapshot = self.repo.load_criteria().await?;
        let weights = CompositeCalculator::weights_of(&snapshot.active());
        let scores = self.repo.list_project_scores(project_id).await?;
        Ok(CompositeCalculator::compute(project_id, &weights, &scores))
    }

    /// Advances one score's status by one step.
    ///
    /// Locking requires a manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the score does not exist, the transition is not the
    /// next step, or the actor lacks the role.
    pub async fn update_score_status(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        criteria_id: CriterionId,
        status: ScoreStatus,
    ) -> Result<ProjectScore, ScoringError> {
        ensure_may_set(actor, status)?;

        let before = self
            .repo
            .list_project_scores(project_id)
            .await?
            .into_iter()
            .find(|s| s.criteria_id == criteria_id)
            .ok_or(ScoringError::ScoreNotFound {
                project_id,
                criteria_id,
            })?;
        let new_status = ScoreWorkflow::transition(before.status, status)?;

        let now = Utc::now();
        let mut after = before.clone();
        after.status = new_status;
        after.updated_at = now;
        let commit = ScoreCommit {
            audit: vec![audit_row(ScoringAuditAction::StatusChanged, Some(&before), &after, actor, now)],
            upserts: vec![after.clone()],
        };
        self.repo.commit_scores(commit).await?;

        info!(project_id = %project_id, criteria_id = %criteria_id, status = %new_status, "Score status changed");
        Ok(after)
    }

    /// Promotes every draft score of a project to submitted.
    ///
    /// Returns the promoted rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor may not score or the store fails.
    pub async fn submit_all_project_scores(
        &self,
        actor: &Actor,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectScore>, ScoringError> {
        self.promote_all(actor, project_id, ScoreStatus::Draft, ScoreStatus::Submitted)
            .await
    }

    /// Promotes every submitted score of a project to locked.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor cannot manage scores or the store fails.
    pub async fn lock_all_project_scores(
        &self,
        actor: &Actor,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectScore>, ScoringError> {
        self.promote_all(actor, project_id, ScoreStatus::Submitted, ScoreStatus::Locked)
            .await
    }

    /// Scoring completeness of a project against the active criteria.
    ///
    /// Falls back to all-zero progress when the store is unavailable.
    ///
    /// # Errors
    ///
    /// Returns an error for non-transient store failures.
    pub async fn get_scoring_progress(&self, project_id: ProjectId) -> Result<ScoringProgress, ScoringError> {
        match self.progress(project_id).await {
            Err(ScoringError::Store(err)) if err.is_transient() => {
                warn!(project_id = %project_id, error = %err, "Scoring progress unavailable, returning empty progress");
                Ok(ScoringProgress::default())
            }
            other => other,
        }
    }

    async fn progress(&self, project_id: ProjectId) -> Result<ScoringProgress, ScoringError> {
        let snapshot = self.repo.load_criteria().await?;
        let active: HashSet<CriterionId> = snapshot.active().iter().map(|c| c.id).collect();
        let scores = self.repo.list_project_scores(project_id).await?;

        let mut progress = ScoringProgress {
            total_criteria: active.len(),
            ..ScoringProgress::default()
        };
        for score in scores.iter().filter(|s| active.contains(&s.criteria_id)) {
            progress.scored_criteria += 1;
            match score.status {
                ScoreStatus::Draft => progress.draft += 1,
                ScoreStatus::Submitted => progress.submitted += 1,
                ScoreStatus::Locked => progress.locked += 1,
            }
        }
        progress.unscored_criteria = progress.total_criteria.saturating_sub(progress.scored_criteria);
        if progress.total_criteria > 0 {
            progress.completion_percent = (Decimal::from(progress.scored_criteria) * Decimal::ONE_HUNDRED
                / Decimal::from(progress.total_criteria))
            .round_dp(2);
        }
        Ok(progress)
    }

    async fn promote_all(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        from: ScoreStatus,
        to: ScoreStatus,
    ) -> Result<Vec<ProjectScore>, ScoringError> {
        ensure_may_set(actor, to)?;

        let now = Utc::now();
        let mut commit = ScoreCommit::default();
        for before in self.repo.list_project_scores(project_id).await? {
            if before.status != from {
                continue;
            }
            let mut after = before.clone();
            after.status = ScoreWorkflow::transition(from, to)?;
            after.updated_at = now;
            commit.audit.push(audit_row(
                ScoringAuditAction::StatusChanged,
                Some(&before),
                &after,
                actor,
                now,
            ));
            commit.upserts.push(after);
        }

        if commit.is_empty() {
            return Ok(Vec::new());
        }
        let promoted = commit.upserts.clone();
        self.repo.commit_scores(commit).await?;
        info!(project_id = %project_id, status = %to, count = promoted.len(), "Project scores promoted");
        Ok(promoted)
    }
}

fn ensure_may_set(actor: &Actor, status: ScoreStatus) -> Result<(), ScoringError> {
    match status {
        ScoreStatus::Locked if !actor.can_manage() => Err(ScoringError::PermissionDenied("lock scores")),
        _ if !actor.can_score() => Err(ScoringError::PermissionDenied("change score status")),
        _ => Ok(()),
    }
}

fn audit_row(
    action: ScoringAuditAction,
    before: Option<&ProjectScore>,
    after: &ProjectScore,
    actor: &Actor,
    now: DateTime<Utc>,
) -> ScoringAuditEntry {
    ScoringAuditEntry {
        id: AuditEntryId::new(),
        project_id: after.project_id,
        criteria_id: after.criteria_id,
        action,
        old_score: before.map(|s| s.score),
        new_score: Some(after.score),
        old_justification: before.and_then(|s| s.justification.clone()),
        new_justification: after.justification.clone(),
        old_status: before.map(|s| s.status),
        new_status: Some(after.status),
        changed_by: actor.user_id,
        changed_at: now,
    }
}
