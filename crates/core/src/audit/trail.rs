//! Read side of the append-only audit log.

use std::future::Future;
use std::sync::Arc;

use keystone_shared::types::{CriterionId, ProjectId};
use tracing::warn;

use super::error::AuditError;
use super::types::{AuditActivity, CriteriaAuditEntry, ScoringAuditEntry};
use crate::store::StoreError;

/// Upper bound on `limit` for the activity feed.
pub const MAX_RECENT_ACTIVITY: u64 = 500;

/// Repository trait for reading audit rows. Rows are only ever written as part
/// of criteria and score commits.
pub trait AuditRepository: Send + Sync {
    /// Scoring rows of a project, newest first.
    fn project_scoring_audit(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<ScoringAuditEntry>, StoreError>> + Send;

    /// Criteria rows, newest first, optionally for one criterion.
    fn criteria_audit(
        &self,
        criteria_id: Option<CriterionId>,
    ) -> impl Future<Output = Result<Vec<CriteriaAuditEntry>, StoreError>> + Send;

    /// Latest scoring rows across all projects.
    fn recent_scoring_audit(
        &self,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<ScoringAuditEntry>, StoreError>> + Send;

    /// Latest criteria rows.
    fn recent_criteria_audit(
        &self,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<CriteriaAuditEntry>, StoreError>> + Send;
}

/// Audit trail queries.
pub struct AuditTrail<R> {
    repo: Arc<R>,
    default_limit: u64,
}

impl<R> Clone for AuditTrail<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            default_limit: self.default_limit,
        }
    }
}

impl<R: AuditRepository> AuditTrail<R> {
    /// Create a new audit trail. `default_limit` applies when a feed query gives none.
    #[must_use]
    pub const fn new(repo: Arc<R>, default_limit: u64) -> Self {
        Self { repo, default_limit }
    }

    /// Every scoring change of a project, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_project_audit_history(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ScoringAuditEntry>, AuditError> {
        let mut entries = self.repo.project_scoring_audit(project_id).await?;
        newest_first(&mut entries, |e| (e.changed_at, e.id));
        Ok(entries)
    }

    /// Scoring changes of one (project, criterion) cell, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_criterion_audit_history(
        &self,
        project_id: ProjectId,
        criteria_id: CriterionId,
    ) -> Result<Vec<ScoringAuditEntry>, AuditError> {
        let mut entries: Vec<ScoringAuditEntry> = self
            .repo
            .project_scoring_audit(project_id)
            .await?
            .into_iter()
            .filter(|e| e.criteria_id == criteria_id)
            .collect();
        newest_first(&mut entries, |e| (e.changed_at, e.id));
        Ok(entries)
    }

    /// Criteria changes, newest first, optionally for one criterion.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_criteria_audit_history(
        &self,
        criteria_id: Option<CriterionId>,
    ) -> Result<Vec<CriteriaAuditEntry>, AuditError> {
        let mut entries = self.repo.criteria_audit(criteria_id).await?;
        newest_first(&mut entries, |e| (e.changed_at, e.id));
        Ok(entries)
    }

    /// Latest criteria and scoring changes merged newest first.
    ///
    /// Returns an empty feed when the store is unavailable.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero limit or non-transient store failures.
    pub async fn get_recent_audit_activity(
        &self,
        limit: Option<u64>,
    ) -> Result<Vec<AuditActivity>, AuditError> {
        let limit = limit.unwrap_or(self.default_limit);
        if limit == 0 {
            return Err(AuditError::InvalidLimit(limit));
        }
        let limit = limit.min(MAX_RECENT_ACTIVITY);

        match self.merged(limit).await {
            Err(err) if err.is_transient() => {
                warn!(error = %err, "Audit log unavailable, returning empty activity");
                Ok(Vec::new())
            }
            other => other.map_err(Into::into),
        }
    }

    async fn merged(&self, limit: u64) -> Result<Vec<AuditActivity>, StoreError> {
        let scoring = self.repo.recent_scoring_audit(limit).await?;
        let criteria = self.repo.recent_criteria_audit(limit).await?;

        let mut activity: Vec<AuditActivity> = scoring
            .into_iter()
            .map(AuditActivity::Scoring)
            .chain(criteria.into_iter().map(AuditActivity::Criteria))
            .collect();
        activity.sort_by_key(|a| std::cmp::Reverse(a.changed_at()));
        activity.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(activity)
    }
}

fn newest_first<T, K: Ord>(entries: &mut [T], key: impl Fn(&T) -> K) {
    entries.sort_by_key(|e| std::cmp::Reverse(key(e)));
}
