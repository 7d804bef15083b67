//! Budget allocation engine.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use keystone_shared::config::BudgetConfig;
use keystone_shared::types::{Actor, AllocationId, BudgetCycleId, ProjectId};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::error::BudgetError;
use super::planner::AllocationPlanner;
use super::service::BudgetService;
use super::types::{
    AllocateProjectInput, AllocationStatus, BudgetAllocation, BudgetCycle, BudgetSummary,
    BudgetWrite, BulkItemOutcome, BulkItemStatus, BulkOutcome, CreateBudgetCycleInput,
    CycleStatus, RankingAllocationResult, UpdateAllocationInput, UpdateBudgetCycleInput,
};
use crate::ranking::RankingRepository;
use crate::store::StoreError;

/// Repository trait for budget cycles and allocations.
pub trait BudgetRepository: Send + Sync {
    /// Every cycle.
    fn list_cycles(&self) -> impl Future<Output = Result<Vec<BudgetCycle>, StoreError>> + Send;

    /// One cycle.
    fn get_cycle(
        &self,
        id: BudgetCycleId,
    ) -> impl Future<Output = Result<Option<BudgetCycle>, StoreError>> + Send;

    /// Allocations of one cycle.
    fn list_allocations(
        &self,
        cycle_id: BudgetCycleId,
    ) -> impl Future<Output = Result<Vec<BudgetAllocation>, StoreError>> + Send;

    /// One allocation.
    fn get_allocation(
        &self,
        id: AllocationId,
    ) -> impl Future<Output = Result<Option<BudgetAllocation>, StoreError>> + Send;

    /// Applies every write in one transaction, or none of them.
    fn apply_budget_writes(
        &self,
        writes: Vec<BudgetWrite>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Budget allocation engine service.
pub struct BudgetAllocationEngine<R> {
    repo: Arc<R>,
    config: BudgetConfig,
}

impl<R> Clone for BudgetAllocationEngine<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: self.config.clone(),
        }
    }
}

impl<R: BudgetRepository + RankingRepository> BudgetAllocationEngine<R> {
    /// Create a new engine.
    #[must_use]
    pub const fn new(repo: Arc<R>, config: BudgetConfig) -> Self {
        Self { repo, config }
    }

    /// Creates a budget cycle in planning status.
    ///
    /// Duration is clamped to 1–30 years and rates to 0–20%.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller cannot manage budgets
    /// - Name is empty, start year or total budget is invalid
    /// - A funding constraint lies outside the cycle or is negative
    pub async fn create_budget_cycle(
        &self,
        actor: &Actor,
        input: CreateBudgetCycleInput,
    ) -> Result<BudgetCycle, BudgetError> {
        ensure_manager(actor, "create budget cycles")?;
        let name = validate_name(&input.name)?;
        let start_year = BudgetService::validate_start_year(input.start_year)?;
        let duration_years = BudgetService::clamp_duration(input.duration_years);
        let end_year = BudgetService::end_year(start_year, duration_years);
        let now = Utc::now();

        let cycle = BudgetCycle {
            id: BudgetCycleId::new(),
            name,
            description: input.description,
            start_year,
            duration_years,
            end_year,
            total_budget: BudgetService::validate_amount("total_budget", input.total_budget)?,
            inflation_rate: BudgetService::clamp_rate(input.inflation_rate),
            escalation_rate: BudgetService::clamp_rate(input.escalation_rate),
            funding_constraints: BudgetService::normalize_constraints(
                start_year,
                end_year,
                input.funding_constraints,
            )?,
            status: CycleStatus::Planning,
            created_by: actor.user_id,
            created_at: now,
            updated_at: now,
        };

        self.repo
            .apply_budget_writes(vec![BudgetWrite::SaveCycle(cycle.clone())])
            .await?;
        info!(cycle_id = %cycle.id, start_year, end_year, total_budget = %cycle.total_budget, "Budget cycle created");
        Ok(cycle)
    }

    /// Updates a budget cycle with the same normalization as creation.
    ///
    /// # Errors
    ///
    /// Returns an error if the cycle is unknown or closed, the new bounds would
    /// strand existing allocations, or (when funding constraints are enforced)
    /// existing allocations would exceed a new constraint.
    pub async fn update_budget_cycle(
        &self,
        actor: &Actor,
        id: BudgetCycleId,
        input: UpdateBudgetCycleInput,
    ) -> Result<BudgetCycle, BudgetError> {
        ensure_manager(actor, "update budget cycles")?;
        let mut cycle = self.cycle(id).await?;
        BudgetService::ensure_open(&cycle)?;

        if let Some(name) = &input.name {
            cycle.name = validate_name(name)?;
        }
        if let Some(description) = input.description {
            cycle.description = description;
        }
        if let Some(start_year) = input.start_year {
            cycle.start_year = BudgetService::validate_start_year(start_year)?;
        }
        if let Some(duration) = input.duration_years {
            cycle.duration_years = BudgetService::clamp_duration(duration);
        }
        cycle.end_year = BudgetService::end_year(cycle.start_year, cycle.duration_years);
        if let Some(total) = input.total_budget {
            cycle.total_budget = BudgetService::validate_amount("total_budget", total)?;
        }
        if let Some(rate) = input.inflation_rate {
            cycle.inflation_rate = BudgetService::clamp_rate(rate);
        }
        if let Some(rate) = input.escalation_rate {
            cycle.escalation_rate = BudgetService::clamp_rate(rate);
        }
        let constraints = input
            .funding_constraints
            .unwrap_or_else(|| cycle.funding_constraints.clone());
        cycle.funding_constraints =
            BudgetService::normalize_constraints(cycle.start_year, cycle.end_year, constraints)?;

        let allocations = self.repo.list_allocations(id).await?;
        let stranded = allocations
            .iter()
            .filter(|a| !cycle.contains_year(a.year))
            .count();
        if stranded > 0 {
            return Err(BudgetError::StrandedAllocations {
                count: stranded,
                start_year: cycle.start_year,
                end_year: cycle.end_year,
            });
        }
        if self.config.enforce_funding_constraints {
            for constraint in &cycle.funding_constraints {
                BudgetService::check_funding(&cycle, &allocations, constraint.year, Decimal::ZERO, None)?;
            }
        }

        cycle.updated_at = Utc::now();
        self.repo
            .apply_budget_writes(vec![BudgetWrite::SaveCycle(cycle.clone())])
            .await?;
        info!(cycle_id = %id, "Budget cycle updated");
        Ok(cycle)
    }

    /// Deletes a cycle and its allocations.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller cannot manage budgets or the cycle is unknown.
    pub async fn delete_budget_cycle(&self, actor: &Actor, id: BudgetCycleId) -> Result<(), BudgetError> {
        ensure_manager(actor, "delete budget cycles")?;
        self.cycle(id).await?;
        self.repo
            .apply_budget_writes(vec![BudgetWrite::DeleteCycle(id)])
            .await?;
        info!(cycle_id = %id, "Budget cycle deleted");
        Ok(())
    }

    /// Gets a cycle by ID.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::CycleNotFound` for unknown ids.
    pub async fn get_budget_cycle(&self, id: BudgetCycleId) -> Result<BudgetCycle, BudgetError> {
        self.cycle(id).await
    }

    /// Lists cycles, newest start year first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_budget_cycles(&self, include_archived: bool) -> Result<Vec<BudgetCycle>, BudgetError> {
        let mut cycles: Vec<BudgetCycle> = self
            .repo
            .list_cycles()
            .await?
            .into_iter()
            .filter(|c| include_archived || c.status != CycleStatus::Archived)
            .collect();
        cycles.sort_by(|a, b| {
            b.start_year
                .cmp(&a.start_year)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(cycles)
    }

    /// Moves a cycle to its next status, or to archived.
    ///
    /// # Errors
    ///
    /// Returns an error if the cycle is unknown or the transition is not allowed.
    pub async fn transition_cycle_status(
        &self,
        actor: &Actor,
        id: BudgetCycleId,
        to: CycleStatus,
    ) -> Result<BudgetCycle, BudgetError> {
        ensure_manager(actor, "change budget cycle status")?;
        let mut cycle = self.cycle(id).await?;
        let from = cycle.status;
        if !from.can_transition_to(to) {
            return Err(BudgetError::InvalidCycleTransition { from, to });
        }
        cycle.status = to;
        cycle.updated_at = Utc::now();
        self.repo
            .apply_budget_writes(vec![BudgetWrite::SaveCycle(cycle.clone())])
            .await?;
        info!(cycle_id = %id, from = %from, to = %to, "Budget cycle status changed");
        Ok(cycle)
    }

    /// Allocates funding for a project in one cycle year, as proposed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The cycle is unknown or closed
    /// - The year is outside the cycle or the amount is negative
    /// - Funding constraints are enforced and the year would exceed its cap
    pub async fn allocate_project(
        &self,
        actor: &Actor,
        input: AllocateProjectInput,
    ) -> Result<BudgetAllocation, BudgetError> {
        ensure_manager(actor, "allocate projects")?;
        let cycle = self.cycle(input.cycle_id).await?;
        BudgetService::ensure_open(&cycle)?;
        let year = BudgetService::validate_year(&cycle, input.year)?;
        let amount = BudgetService::validate_amount("amount", input.amount)?;
        let priority = input.priority.map(validate_priority).transpose()?;

        if self.config.enforce_funding_constraints {
            let allocations = self.repo.list_allocations(cycle.id).await?;
            BudgetService::check_funding(&cycle, &allocations, year, amount, None)?;
        }

        let now = Utc::now();
        let allocation = BudgetAllocation {
            id: AllocationId::new(),
            cycle_id: cycle.id,
            project_id: input.project_id,
            year,
            allocated_amount: amount,
            priority,
            justification: input.justification,
            status: AllocationStatus::Proposed,
            created_by: actor.user_id,
            created_at: now,
            updated_at: now,
        };
        self.save_allocations(&cycle, std::slice::from_ref(&allocation)).await?;
        info!(
            allocation_id = %allocation.id,
            cycle_id = %cycle.id,
            project_id = %allocation.project_id,
            year,
            amount = %amount,
            "Project allocated"
        );
        Ok(allocation)
    }

    /// Edits an allocation's amount, year, priority, justification or status.
    ///
    /// # Errors
    ///
    /// Returns an error if the allocation or cycle is unknown, the cycle is
    /// closed, the new year or amount is invalid, the status does not move
    /// forward one step, or a funding constraint would be exceeded.
    pub async fn update_allocation(
        &self,
        actor: &Actor,
        id: AllocationId,
        input: UpdateAllocationInput,
    ) -> Result<BudgetAllocation, BudgetError> {
        ensure_manager(actor, "update allocations")?;
        let mut allocation = self.allocation(id).await?;
        let cycle = self.cycle(allocation.cycle_id).await?;
        BudgetService::ensure_open(&cycle)?;

        if let Some(year) = input.year {
            allocation.year = BudgetService::validate_year(&cycle, year)?;
        }
        if let Some(amount) = input.amount {
            allocation.allocated_amount = BudgetService::validate_amount("amount", amount)?;
        }
        if let Some(priority) = input.priority {
            allocation.priority = priority.map(validate_priority).transpose()?;
        }
        if let Some(justification) = input.justification {
            allocation.justification = justification;
        }
        if let Some(status) = input.status {
            if status != allocation.status {
                if !allocation.status.can_transition_to(status) {
                    return Err(BudgetError::InvalidAllocationTransition {
                        from: allocation.status,
                        to: status,
                    });
                }
                allocation.status = status;
            }
        }

        if self.config.enforce_funding_constraints {
            let allocations = self.repo.list_allocations(cycle.id).await?;
            BudgetService::check_funding(
                &cycle,
                &allocations,
                allocation.year,
                allocation.allocated_amount,
                Some(id),
            )?;
        }

        allocation.updated_at = Utc::now();
        self.save_allocations(&cycle, std::slice::from_ref(&allocation)).await?;
        info!(allocation_id = %id, status = %allocation.status, "Allocation updated");
        Ok(allocation)
    }

    /// Deletes an allocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the allocation is unknown or its cycle is closed.
    pub async fn delete_allocation(&self, actor: &Actor, id: AllocationId) -> Result<(), BudgetError> {
        ensure_manager(actor, "delete allocations")?;
        let allocation = self.allocation(id).await?;
        let cycle = self.cycle(allocation.cycle_id).await?;
        BudgetService::ensure_open(&cycle)?;
        self.repo
            .apply_budget_writes(vec![BudgetWrite::DeleteAllocation(id)])
            .await?;
        info!(allocation_id = %id, "Allocation deleted");
        Ok(())
    }

    /// Allocations of a cycle ordered by year, then priority.
    ///
    /// # Errors
    ///
    /// Returns an error if the cycle is unknown.
    pub async fn list_allocations(&self, cycle_id: BudgetCycleId) -> Result<Vec<BudgetAllocation>, BudgetError> {
        self.cycle(cycle_id).await?;
        let mut allocations = self.repo.list_allocations(cycle_id).await?;
        allocations.sort_by(|a, b| {
            a.year
                .cmp(&b.year)
                .then_with(|| a.priority.unwrap_or(i32::MAX).cmp(&b.priority.unwrap_or(i32::MAX)))
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(allocations)
    }

    /// Per-year totals, escalation and funding-constraint headroom.
    ///
    /// # Errors
    ///
    /// Returns an error if the cycle is unknown.
    pub async fn get_budget_summary_by_year(&self, cycle_id: BudgetCycleId) -> Result<BudgetSummary, BudgetError> {
        let cycle = self.cycle(cycle_id).await?;
        let allocations = self.repo.list_allocations(cycle_id).await?;
        let summary = BudgetService::summarize(&cycle, &allocations)?;
        for year in summary.years.iter().filter(|y| y.over_constraint) {
            warn!(
                cycle_id = %cycle_id,
                year = year.year,
                allocated = %year.allocated,
                constraint = ?year.constraint,
                "Funding constraint overrun"
            );
        }
        Ok(summary)
    }

    /// Archives cycles, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller cannot manage budgets or the store fails.
    /// Per-item failures are reported in the outcome.
    pub async fn bulk_archive_cycles(
        &self,
        actor: &Actor,
        ids: &[BudgetCycleId],
    ) -> Result<BulkOutcome<BudgetCycleId>, BudgetError> {
        ensure_manager(actor, "archive budget cycles")?;
        let now = Utc::now();
        let ids = distinct(ids);
        let mut run = BulkRun::new(&ids);
        for &id in &ids {
            let planned = match self.cycle(id).await {
                Ok(mut cycle) if cycle.status.can_transition_to(CycleStatus::Archived) => {
                    cycle.status = CycleStatus::Archived;
                    cycle.updated_at = now;
                    Ok(BudgetWrite::SaveCycle(cycle))
                }
                Ok(cycle) => Err(BudgetError::InvalidCycleTransition {
                    from: cycle.status,
                    to: CycleStatus::Archived,
                }),
                Err(err) => Err(err),
            };
            if !run.record(id, planned) {
                break;
            }
        }
        self.finish_bulk(run, "archive cycles").await
    }

    /// Deletes cycles and their allocations, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller cannot manage budgets or the store fails.
    /// Per-item failures are reported in the outcome.
    pub async fn bulk_delete_cycles(
        &self,
        actor: &Actor,
        ids: &[BudgetCycleId],
    ) -> Result<BulkOutcome<BudgetCycleId>, BudgetError> {
        ensure_manager(actor, "delete budget cycles")?;
        let ids = distinct(ids);
        let mut run = BulkRun::new(&ids);
        for &id in &ids {
            let planned = self.cycle(id).await.map(|_| BudgetWrite::DeleteCycle(id));
            if !run.record(id, planned) {
                break;
            }
        }
        self.finish_bulk(run, "delete cycles").await
    }

    /// Deletes allocations, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller cannot manage budgets or the store fails.
    /// Per-item failures are reported in the outcome.
    pub async fn bulk_delete_allocations(
        &self,
        actor: &Actor,
        ids: &[AllocationId],
    ) -> Result<BulkOutcome<AllocationId>, BudgetError> {
        ensure_manager(actor, "delete allocations")?;
        let ids = distinct(ids);
        let mut run = BulkRun::new(&ids);
        for &id in &ids {
            let planned = match self.allocation(id).await {
                Ok(allocation) => match self.cycle(allocation.cycle_id).await {
                    Ok(cycle) => {
                        BudgetService::ensure_open(&cycle).map(|()| BudgetWrite::DeleteAllocation(id))
                    }
                    Err(err) => Err(err),
                },
                Err(err) => Err(err),
            };
            if !run.record(id, planned) {
                break;
            }
        }
        self.finish_bulk(run, "delete allocations").await
    }

    /// Turns the ranking cache into proposed allocations.
    ///
    /// `costs` maps candidate projects to their cost in start-year dollars.
    /// Candidates are placed in rank order into the earliest year with room.
    ///
    /// # Errors
    ///
    /// Returns an error if the cycle is unknown or closed, a cost is negative,
    /// or the store fails.
    pub async fn allocate_from_ranking(
        &self,
        actor: &Actor,
        cycle_id: BudgetCycleId,
        costs: &BTreeMap<ProjectId, Decimal>,
    ) -> Result<RankingAllocationResult, BudgetError> {
        ensure_manager(actor, "allocate projects")?;
        let cycle = self.cycle(cycle_id).await?;
        BudgetService::ensure_open(&cycle)?;
        let costs = costs
            .iter()
            .map(|(&project_id, &cost)| Ok((project_id, BudgetService::validate_amount("costs", cost)?)))
            .collect::<Result<BTreeMap<_, _>, BudgetError>>()?;

        let ranking = self.repo.ranked_entries().await?;
        let existing = self.repo.list_allocations(cycle_id).await?;
        let plan = AllocationPlanner::plan(&cycle, &existing, &ranking, &costs)?;

        let now = Utc::now();
        let allocations: Vec<BudgetAllocation> = plan
            .placed
            .iter()
            .map(|placed| BudgetAllocation {
                id: AllocationId::new(),
                cycle_id,
                project_id: placed.project_id,
                year: placed.year,
                allocated_amount: placed.amount,
                priority: Some(i32::try_from(placed.rank).unwrap_or(i32::MAX)),
                justification: Some(format!(
                    "Ranked #{} with composite score {}; cost escalated to {} for {}",
                    placed.rank, placed.composite_score, placed.amount, placed.year
                )),
                status: AllocationStatus::Proposed,
                created_by: actor.user_id,
                created_at: now,
                updated_at: now,
            })
            .collect();

        if !allocations.is_empty() {
            self.save_allocations(&cycle, &allocations).await?;
        }
        info!(
            cycle_id = %cycle_id,
            placed = allocations.len(),
            unplaced = plan.unplaced.len(),
            "Allocated from ranking"
        );
        Ok(RankingAllocationResult {
            allocations,
            unplaced: plan.unplaced,
        })
    }

    /// Saves allocations in one batch. With enforcement on, every constrained
    /// year they touch is re-checked inside the store batch, so concurrent
    /// writers cannot jointly overrun a cap.
    async fn save_allocations(
        &self,
        cycle: &BudgetCycle,
        allocations: &[BudgetAllocation],
    ) -> Result<(), BudgetError> {
        let guarded: BTreeSet<i32> = if self.config.enforce_funding_constraints {
            allocations
                .iter()
                .map(|a| a.year)
                .filter(|&year| cycle.constraint_for(year).is_some())
                .collect()
        } else {
            BTreeSet::new()
        };
        let writes = allocations
            .iter()
            .cloned()
            .map(BudgetWrite::SaveAllocation)
            .chain(guarded.iter().map(|&year| BudgetWrite::EnsureWithinFunding {
                cycle_id: cycle.id,
                year,
            }))
            .collect();

        match self.repo.apply_budget_writes(writes).await {
            Err(StoreError::Conflict) if !guarded.is_empty() => {
                // Another writer got there first; report the cap it now breaks.
                let current = self.repo.list_allocations(cycle.id).await?;
                for allocation in allocations {
                    BudgetService::check_funding(
                        cycle,
                        &current,
                        allocation.year,
                        allocation.allocated_amount,
                        Some(allocation.id),
                    )?;
                }
                warn!(cycle_id = %cycle.id, "Funding guard rejected a batch that now fits");
                Err(StoreError::Conflict.into())
            }
            result => result.map_err(BudgetError::from),
        }
    }

    async fn cycle(&self, id: BudgetCycleId) -> Result<BudgetCycle, BudgetError> {
        self.repo
            .get_cycle(id)
            .await?
            .ok_or(BudgetError::CycleNotFound(id))
    }

    async fn allocation(&self, id: AllocationId) -> Result<BudgetAllocation, BudgetError> {
        self.repo
            .get_allocation(id)
            .await?
            .ok_or(BudgetError::AllocationNotFound(id))
    }

    async fn finish_bulk<Id: Copy + Eq + std::hash::Hash>(
        &self,
        run: BulkRun<Id>,
        operation: &'static str,
    ) -> Result<BulkOutcome<Id>, BudgetError> {
        let (outcome, writes) = run.finish();
        if outcome.committed && !writes.is_empty() {
            self.repo.apply_budget_writes(writes).await?;
            info!(operation, count = outcome.items.len(), "Bulk budget operation applied");
        } else if !outcome.committed {
            warn!(operation, failed = outcome.failed().count(), "Bulk budget operation rolled back");
        }
        Ok(outcome)
    }
}

/// Accumulates per-item outcomes and writes of a bulk operation.
struct BulkRun<Id> {
    requested: Vec<Id>,
    items: Vec<BulkItemOutcome<Id>>,
    writes: Vec<BudgetWrite>,
    failed: bool,
}

impl<Id: Copy> BulkRun<Id> {
    fn new(ids: &[Id]) -> Self {
        Self {
            requested: ids.to_vec(),
            items: Vec::with_capacity(ids.len()),
            writes: Vec::with_capacity(ids.len()),
            failed: false,
        }
    }

    /// Records one item; returns whether processing should continue.
    fn record(&mut self, id: Id, planned: Result<BudgetWrite, BudgetError>) -> bool {
        match planned {
            Ok(write) => {
                self.writes.push(write);
                self.items.push(BulkItemOutcome {
                    id,
                    status: BulkItemStatus::Succeeded,
                });
                true
            }
            Err(err) => {
                self.items.push(BulkItemOutcome {
                    id,
                    status: BulkItemStatus::Failed(err.to_string()),
                });
                self.failed = true;
                false
            }
        }
    }

    fn finish(mut self) -> (BulkOutcome<Id>, Vec<BudgetWrite>) {
        if !self.failed {
            return (
                BulkOutcome {
                    committed: true,
                    items: self.items,
                },
                self.writes,
            );
        }
        for item in &mut self.items {
            if item.status == BulkItemStatus::Succeeded {
                item.status = BulkItemStatus::RolledBack;
            }
        }
        for &id in &self.requested[self.items.len()..] {
            self.items.push(BulkItemOutcome {
                id,
                status: BulkItemStatus::Skipped,
            });
        }
        (
            BulkOutcome {
                committed: false,
                items: self.items,
            },
            Vec::new(),
        )
    }
}

/// Request ids with repeats removed, first occurrence kept.
fn distinct<Id: Copy + Eq + std::hash::Hash>(ids: &[Id]) -> Vec<Id> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

const fn ensure_manager(actor: &Actor, action: &'static str) -> Result<(), BudgetError> {
    if actor.can_manage() {
        Ok(())
    } else {
        Err(BudgetError::PermissionDenied(action))
    }
}

fn validate_name(name: &str) -> Result<String, BudgetError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BudgetError::validation("name", "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_priority(priority: i32) -> Result<i32, BudgetError> {
    if priority < 0 {
        return Err(BudgetError::validation("priority", "must not be negative"));
    }
    Ok(priority)
}
