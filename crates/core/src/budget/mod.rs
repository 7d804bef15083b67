//! Multi-year capital budget cycles and project allocations.

mod engine;
mod error;
mod planner;
mod service;
mod types;

#[cfg(test)]
mod engine_tests;

pub use engine::{BudgetAllocationEngine, BudgetRepository};
pub use error::BudgetError;
pub use planner::AllocationPlanner;
pub use service::{
    BudgetService, MAX_DURATION_YEARS, MAX_START_YEAR, MIN_DURATION_YEARS, MIN_START_YEAR,
};
pub use types::{
    AllocateProjectInput, AllocationPlan, AllocationStatus, BudgetAllocation, BudgetCycle,
    BudgetSummary, BudgetWrite, BulkItemOutcome, BulkItemStatus, BulkOutcome,
    CreateBudgetCycleInput, CycleStatus, FundingConstraint, PlannedAllocation,
    RankingAllocationResult, UnplacedProject, UnplacedReason, UpdateAllocationInput,
    UpdateBudgetCycleInput, YearSummary,
};
