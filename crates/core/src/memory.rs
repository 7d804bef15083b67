//! In-memory implementation of every repository trait.
//!
//! Used by the service tests and by tooling that runs without a database.
//! [`InMemoryStore::set_unavailable`] simulates a store outage and
//! [`InMemoryStore::inject_criteria_conflicts`] simulates concurrent criteria writers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use keystone_shared::types::{AllocationId, BudgetCycleId, CriterionId, ProjectId};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::audit::{AuditRepository, CriteriaAuditEntry, ScoringAuditEntry};
use crate::budget::{BudgetAllocation, BudgetCycle, BudgetRepository, BudgetWrite};
use crate::criteria::{CriteriaCommit, CriteriaRepository, CriteriaSnapshot, Criterion, ModelVersion};
use crate::environmental::{GreenUpgrade, GreenUpgradeSource};
use crate::ranking::{RankingEntry, RankingMetadata, RankingRepository, RankingSnapshot};
use crate::scoring::{ProjectScore, ScoreCommit, ScoreRepository};
use crate::store::{DataRevision, StoreError};

#[derive(Debug, Default)]
struct State {
    criteria_revision: i64,
    score_revision: i64,
    criteria: BTreeMap<CriterionId, Criterion>,
    model_versions: Vec<ModelVersion>,
    scores: BTreeMap<(ProjectId, CriterionId), ProjectScore>,
    criteria_audit: Vec<CriteriaAuditEntry>,
    scoring_audit: Vec<ScoringAuditEntry>,
    ranking: Option<RankingSnapshot>,
    cycles: BTreeMap<BudgetCycleId, BudgetCycle>,
    allocations: BTreeMap<AllocationId, BudgetAllocation>,
    green_upgrades: Vec<GreenUpgrade>,
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
    pending_conflicts: AtomicU32,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `StoreError::Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes the next `count` criteria commits lose against a simulated concurrent writer.
    pub fn inject_criteria_conflicts(&self, count: u32) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Adds a green upgrade record.
    pub async fn add_green_upgrade(&self, upgrade: GreenUpgrade) {
        self.state.lock().await.green_upgrades.push(upgrade);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::unavailable("in-memory store is offline"))
        } else {
            Ok(())
        }
    }

    fn take_conflict(&self) -> bool {
        self.pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl CriteriaRepository for InMemoryStore {
    async fn load_criteria(&self) -> Result<CriteriaSnapshot, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(CriteriaSnapshot {
            revision: state.criteria_revision,
            criteria: state.criteria.values().cloned().collect(),
            model_versions: state.model_versions.clone(),
        })
    }

    async fn commit_criteria(&self, commit: CriteriaCommit) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().await;
        if self.take_conflict() {
            state.criteria_revision += 1;
            return Err(StoreError::Conflict);
        }
        if state.criteria_revision != commit.expected_revision {
            return Err(StoreError::Conflict);
        }

        for criterion in commit.upserts {
            state.criteria.insert(criterion.id, criterion);
        }
        if !commit.purge_scores_for.is_empty() {
            state
                .scores
                .retain(|(_, criteria_id), _| !commit.purge_scores_for.contains(criteria_id));
            state.score_revision += 1;
        }
        if let Some(version) = commit.activate_model_version {
            for existing in &mut state.model_versions {
                existing.is_active = false;
            }
            state.model_versions.push(version);
        }
        state.criteria_audit.extend(commit.audit);
        state.criteria_revision += 1;
        Ok(())
    }
}

impl ScoreRepository for InMemoryStore {
    async fn list_project_scores(&self, project_id: ProjectId) -> Result<Vec<ProjectScore>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(state
            .scores
            .values()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn list_all_scores(&self) -> Result<Vec<ProjectScore>, StoreError> {
        self.check()?;
        Ok(self.state.lock().await.scores.values().cloned().collect())
    }

    async fn commit_scores(&self, commit: ScoreCommit) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().await;
        for score in commit.upserts {
            state.scores.insert((score.project_id, score.criteria_id), score);
        }
        state.scoring_audit.extend(commit.audit);
        state.score_revision += 1;
        Ok(())
    }
}

impl RankingRepository for InMemoryStore {
    async fn data_revision(&self) -> Result<DataRevision, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(DataRevision::new(state.criteria_revision, state.score_revision))
    }

    async fn replace_ranking(&self, snapshot: RankingSnapshot) -> Result<(), StoreError> {
        self.check()?;
        self.state.lock().await.ranking = Some(snapshot);
        Ok(())
    }

    async fn ranking_metadata(&self) -> Result<RankingMetadata, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(state
            .ranking
            .as_ref()
            .map(|r| RankingMetadata {
                calculated_at: Some(r.calculated_at),
                revision: Some(r.revision),
                entry_count: r.entries.len(),
            })
            .unwrap_or_default())
    }

    async fn ranked_entries(&self) -> Result<Vec<RankingEntry>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(state
            .ranking
            .as_ref()
            .map(|r| r.entries.clone())
            .unwrap_or_default())
    }
}

impl BudgetRepository for InMemoryStore {
    async fn list_cycles(&self) -> Result<Vec<BudgetCycle>, StoreError> {
        self.check()?;
        Ok(self.state.lock().await.cycles.values().cloned().collect())
    }

    async fn get_cycle(&self, id: BudgetCycleId) -> Result<Option<BudgetCycle>, StoreError> {
        self.check()?;
        Ok(self.state.lock().await.cycles.get(&id).cloned())
    }

    async fn list_allocations(&self, cycle_id: BudgetCycleId) -> Result<Vec<BudgetAllocation>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(state
            .allocations
            .values()
            .filter(|a| a.cycle_id == cycle_id)
            .cloned()
            .collect())
    }

    async fn get_allocation(&self, id: AllocationId) -> Result<Option<BudgetAllocation>, StoreError> {
        self.check()?;
        Ok(self.state.lock().await.allocations.get(&id).cloned())
    }

    async fn apply_budget_writes(&self, writes: Vec<BudgetWrite>) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().await;
        let mut cycles = state.cycles.clone();
        let mut allocations = state.allocations.clone();
        let mut guards = Vec::new();
        for write in writes {
            match write {
                BudgetWrite::SaveCycle(cycle) => {
                    cycles.insert(cycle.id, cycle);
                }
                BudgetWrite::DeleteCycle(id) => {
                    allocations.retain(|_, a| a.cycle_id != id);
                    cycles.remove(&id);
                }
                BudgetWrite::SaveAllocation(allocation) => {
                    allocations.insert(allocation.id, allocation);
                }
                BudgetWrite::DeleteAllocation(id) => {
                    allocations.remove(&id);
                }
                BudgetWrite::EnsureWithinFunding { cycle_id, year } => guards.push((cycle_id, year)),
            }
        }

        for (cycle_id, year) in guards {
            let Some(cap) = cycles.get(&cycle_id).and_then(|c| c.constraint_for(year)) else {
                continue;
            };
            let total = allocations
                .values()
                .filter(|a| a.cycle_id == cycle_id && a.year == year)
                .try_fold(Decimal::ZERO, |sum, a| sum.checked_add(a.allocated_amount));
            if total.is_none_or(|total| total > cap) {
                return Err(StoreError::Conflict);
            }
        }

        state.cycles = cycles;
        state.allocations = allocations;
        Ok(())
    }
}

impl AuditRepository for InMemoryStore {
    async fn project_scoring_audit(&self, project_id: ProjectId) -> Result<Vec<ScoringAuditEntry>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(state
            .scoring_audit
            .iter()
            .rev()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn criteria_audit(&self, criteria_id: Option<CriterionId>) -> Result<Vec<CriteriaAuditEntry>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(state
            .criteria_audit
            .iter()
            .rev()
            .filter(|e| criteria_id.is_none_or(|id| e.criteria_id == id))
            .cloned()
            .collect())
    }

    async fn recent_scoring_audit(&self, limit: u64) -> Result<Vec<ScoringAuditEntry>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(state.scoring_audit.iter().rev().take(limit).cloned().collect())
    }

    async fn recent_criteria_audit(&self, limit: u64) -> Result<Vec<CriteriaAuditEntry>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(state.criteria_audit.iter().rev().take(limit).cloned().collect())
    }
}

impl GreenUpgradeSource for InMemoryStore {
    async fn list_green_upgrades(&self, project_id: ProjectId) -> Result<Vec<GreenUpgrade>, StoreError> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(state
            .green_upgrades
            .iter()
            .filter(|u| u.project_id == project_id)
            .cloned()
            .collect())
    }
}
