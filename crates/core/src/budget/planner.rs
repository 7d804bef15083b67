//! Greedy ranking-driven allocation planner.
//!
//! Walks the ranking in rank order and places each candidate's cost,
//! escalated to the candidate year, into the earliest cycle year with enough
//! capacity left. A year's capacity is its funding constraint, or an even
//! share of the total budget when it has none, less what is already
//! allocated there. The cycle's remaining total budget caps every placement.

use std::collections::{BTreeMap, BTreeSet};

use keystone_shared::types::ProjectId;
use rust_decimal::Decimal;

use super::error::BudgetError;
use super::service::{BudgetService, checked_sum};
use super::types::{
    AllocationPlan, BudgetAllocation, BudgetCycle, PlannedAllocation, UnplacedProject,
    UnplacedReason,
};
use crate::ranking::RankingEntry;

/// Stateless allocation planner.
pub struct AllocationPlanner;

impl AllocationPlanner {
    /// Plans placements for the candidates in `costs` (start-year dollars).
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::Overflow` if a total or escalated cost leaves the
    /// decimal range.
    pub fn plan(
        cycle: &BudgetCycle,
        existing: &[BudgetAllocation],
        ranking: &[RankingEntry],
        costs: &BTreeMap<ProjectId, Decimal>,
    ) -> Result<AllocationPlan, BudgetError> {
        let mut capacity = Self::year_capacity(cycle, existing)?;
        let allocated = checked_sum(existing.iter().map(|a| a.allocated_amount), "cycle total")?;
        let mut remaining_total = cycle.total_budget - allocated;
        let already: BTreeSet<ProjectId> = existing.iter().map(|a| a.project_id).collect();

        let mut plan = AllocationPlan::default();
        let mut ranked = BTreeSet::new();
        for entry in ranking {
            let Some(&cost) = costs.get(&entry.project_id) else {
                continue;
            };
            ranked.insert(entry.project_id);
            if already.contains(&entry.project_id) {
                plan.unplaced.push(unplaced(entry.project_id, Some(entry.rank), cost, UnplacedReason::AlreadyAllocated));
                continue;
            }

            let mut slot = None;
            for year in cycle.years() {
                let amount = BudgetService::escalate(cycle, cost, year)?;
                let room = capacity.get(&year).copied().unwrap_or(Decimal::ZERO);
                if amount <= room && amount <= remaining_total {
                    slot = Some((year, amount));
                    break;
                }
            }
            match slot {
                Some((year, amount)) => {
                    if let Some(room) = capacity.get_mut(&year) {
                        *room -= amount;
                    }
                    remaining_total -= amount;
                    plan.placed.push(PlannedAllocation {
                        project_id: entry.project_id,
                        rank: entry.rank,
                        composite_score: entry.composite_score,
                        year,
                        amount,
                    });
                }
                None => plan.unplaced.push(unplaced(
                    entry.project_id,
                    Some(entry.rank),
                    cost,
                    UnplacedReason::InsufficientCapacity,
                )),
            }
        }

        for (&project_id, &cost) in costs {
            if !ranked.contains(&project_id) {
                plan.unplaced.push(unplaced(project_id, None, cost, UnplacedReason::NotRanked));
            }
        }
        Ok(plan)
    }

    /// Remaining capacity of each cycle year.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::Overflow` if a year total leaves the decimal range.
    pub fn year_capacity(
        cycle: &BudgetCycle,
        existing: &[BudgetAllocation],
    ) -> Result<BTreeMap<i32, Decimal>, BudgetError> {
        let even_share = (cycle.total_budget / Decimal::from(cycle.duration_years.max(1))).round_dp(2);
        cycle
            .years()
            .map(|year| {
                let ceiling = cycle.constraint_for(year).unwrap_or(even_share);
                let used = BudgetService::year_total(existing, year, None)?;
                Ok::<_, BudgetError>((year, (ceiling - used).max(Decimal::ZERO)))
            })
            .collect()
    }
}

const fn unplaced(
    project_id: ProjectId,
    rank: Option<u32>,
    cost: Decimal,
    reason: UnplacedReason,
) -> UnplacedProject {
    UnplacedProject {
        project_id,
        rank,
        cost,
        reason,
    }
}
