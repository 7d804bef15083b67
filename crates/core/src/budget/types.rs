//! Capital budget cycle and allocation types.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use keystone_shared::types::{AllocationId, BudgetCycleId, ProjectId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Budget cycle status.
///
/// Moves forward one step at a time; `Archived` is reachable from any other status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// Being drafted.
    Planning,
    /// Approved by the board.
    Approved,
    /// Current funding window.
    Active,
    /// Closed out.
    Completed,
    /// Retired from view.
    Archived,
}

impl CycleStatus {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Parses the canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planning" => Some(Self::Planning),
            "approved" => Some(Self::Approved),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Planning, Self::Approved)
                | (Self::Approved, Self::Active)
                | (Self::Active, Self::Completed)
                | (
                    Self::Planning | Self::Approved | Self::Active | Self::Completed,
                    Self::Archived
                )
        )
    }

    /// Whether allocations in the cycle may be created, edited or deleted.
    #[must_use]
    pub const fn accepts_allocation_changes(self) -> bool {
        !matches!(self, Self::Completed | Self::Archived)
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allocation status. Moves forward one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    /// Suggested, not yet approved.
    Proposed,
    /// Approved for funding.
    Approved,
    /// Money committed.
    Funded,
    /// Work done.
    Completed,
}

impl AllocationStatus {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Approved => "approved",
            Self::Funded => "funded",
            Self::Completed => "completed",
        }
    }

    /// Parses the canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "proposed" => Some(Self::Proposed),
            "approved" => Some(Self::Approved),
            "funded" => Some(Self::Funded),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Proposed, Self::Approved)
                | (Self::Approved, Self::Funded)
                | (Self::Funded, Self::Completed)
        )
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cap on the total allocated in one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingConstraint {
    /// Calendar year inside the cycle.
    pub year: i32,
    /// Maximum total allocation for the year.
    pub max_amount: Decimal,
}

/// Multi-year capital budget window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCycle {
    /// Cycle ID.
    pub id: BudgetCycleId,
    /// Name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// First year.
    pub start_year: i32,
    /// Number of years, 1–30.
    pub duration_years: i32,
    /// Last year, `start_year + duration_years - 1`.
    pub end_year: i32,
    /// Total budget across all years.
    pub total_budget: Decimal,
    /// Annual inflation, percent, 0–20.
    pub inflation_rate: Decimal,
    /// Annual construction cost escalation, percent, 0–20.
    pub escalation_rate: Decimal,
    /// Per-year caps, sorted by year.
    pub funding_constraints: Vec<FundingConstraint>,
    /// Status.
    pub status: CycleStatus,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl BudgetCycle {
    /// Whether `year` lies inside the cycle.
    #[must_use]
    pub const fn contains_year(&self, year: i32) -> bool {
        year >= self.start_year && year <= self.end_year
    }

    /// Years of the cycle in order.
    #[must_use]
    pub const fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    /// Funding cap for a year, if any.
    #[must_use]
    pub fn constraint_for(&self, year: i32) -> Option<Decimal> {
        self.funding_constraints
            .iter()
            .find(|c| c.year == year)
            .map(|c| c.max_amount)
    }
}

/// Funding placed for one project in one cycle year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    /// Allocation ID.
    pub id: AllocationId,
    /// Cycle.
    pub cycle_id: BudgetCycleId,
    /// Project.
    pub project_id: ProjectId,
    /// Year of expenditure.
    pub year: i32,
    /// Amount in year-of-expenditure dollars.
    pub allocated_amount: Decimal,
    /// Priority, usually the project's rank.
    pub priority: Option<i32>,
    /// Why the project is funded.
    pub justification: Option<String>,
    /// Status.
    pub status: AllocationStatus,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a budget cycle.
#[derive(Debug, Clone)]
pub struct CreateBudgetCycleInput {
    /// Name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// First year.
    pub start_year: i32,
    /// Requested duration; clamped to 1–30.
    pub duration_years: i32,
    /// Total budget.
    pub total_budget: Decimal,
    /// Inflation percent; clamped to 0–20.
    pub inflation_rate: Decimal,
    /// Escalation percent; clamped to 0–20.
    pub escalation_rate: Decimal,
    /// Per-year caps.
    pub funding_constraints: Vec<FundingConstraint>,
}

/// Input for updating a budget cycle. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateBudgetCycleInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New first year.
    pub start_year: Option<i32>,
    /// New duration.
    pub duration_years: Option<i32>,
    /// New total budget.
    pub total_budget: Option<Decimal>,
    /// New inflation percent.
    pub inflation_rate: Option<Decimal>,
    /// New escalation percent.
    pub escalation_rate: Option<Decimal>,
    /// Replacement caps.
    pub funding_constraints: Option<Vec<FundingConstraint>>,
}

/// Input for allocating a project.
#[derive(Debug, Clone)]
pub struct AllocateProjectInput {
    /// Cycle.
    pub cycle_id: BudgetCycleId,
    /// Project.
    pub project_id: ProjectId,
    /// Year of expenditure.
    pub year: i32,
    /// Amount.
    pub amount: Decimal,
    /// Priority.
    pub priority: Option<i32>,
    /// Justification.
    pub justification: Option<String>,
}

/// Input for updating an allocation. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateAllocationInput {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New year.
    pub year: Option<i32>,
    /// New priority.
    pub priority: Option<Option<i32>>,
    /// New justification.
    pub justification: Option<Option<String>>,
    /// Next status.
    pub status: Option<AllocationStatus>,
}

/// Totals for one cycle year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSummary {
    /// Year.
    pub year: i32,
    /// Sum of allocations, year-of-expenditure dollars.
    pub allocated: Decimal,
    /// Number of allocations.
    pub allocation_count: usize,
    /// `(1 + (inflation + escalation) / 100) ^ (year - start_year)`.
    pub escalation_factor: Decimal,
    /// `allocated / escalation_factor`, two decimals.
    pub base_year_amount: Decimal,
    /// Funding cap, if any.
    pub constraint: Option<Decimal>,
    /// `constraint - allocated`, if capped. Negative on overrun.
    pub headroom: Option<Decimal>,
    /// Whether the year is above its cap.
    pub over_constraint: bool,
}

/// Per-year and whole-cycle totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSummary {
    /// Cycle.
    pub cycle_id: BudgetCycleId,
    /// Total budget.
    pub total_budget: Decimal,
    /// Sum of every allocation.
    pub total_allocated: Decimal,
    /// `total_budget - total_allocated`.
    pub remaining_budget: Decimal,
    /// Number of allocations.
    pub allocation_count: usize,
    /// One entry per cycle year, in order.
    pub years: Vec<YearSummary>,
    /// Whether any year is above its cap.
    pub has_overrun: bool,
}

/// Outcome of one item in a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum BulkItemStatus {
    /// Applied.
    Succeeded,
    /// Rejected; the batch was not applied.
    Failed(String),
    /// Would have succeeded, but another item failed.
    RolledBack,
    /// Not attempted because an earlier item failed.
    Skipped,
}

/// One item of a bulk outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemOutcome<Id> {
    /// Item ID.
    pub id: Id,
    /// What happened.
    pub status: BulkItemStatus,
}

/// Per-item outcomes of an all-or-nothing bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome<Id> {
    /// Whether the batch was applied.
    pub committed: bool,
    /// One entry per distinct requested ID, in first-request order.
    pub items: Vec<BulkItemOutcome<Id>>,
}

impl<Id> BulkOutcome<Id> {
    /// Number of items applied.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == BulkItemStatus::Succeeded)
            .count()
    }

    /// Items that need retrying.
    pub fn failed(&self) -> impl Iterator<Item = &BulkItemOutcome<Id>> {
        self.items
            .iter()
            .filter(|i| matches!(i.status, BulkItemStatus::Failed(_)))
    }
}

/// A proposed allocation made by the ranking-driven planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAllocation {
    /// Project.
    pub project_id: ProjectId,
    /// Rank in the ranking cache.
    pub rank: u32,
    /// Composite score from the ranking cache.
    pub composite_score: Decimal,
    /// Year placed in.
    pub year: i32,
    /// Cost escalated to `year`.
    pub amount: Decimal,
}

/// Why the planner could not place a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    /// No year had enough remaining capacity.
    InsufficientCapacity,
    /// The project already has an allocation in the cycle.
    AlreadyAllocated,
    /// The project is not in the ranking cache.
    NotRanked,
}

/// A candidate the planner could not place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnplacedProject {
    /// Project.
    pub project_id: ProjectId,
    /// Rank, if ranked.
    pub rank: Option<u32>,
    /// Base-year cost requested.
    pub cost: Decimal,
    /// Reason.
    pub reason: UnplacedReason,
}

/// Result of planning allocations from the ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    /// Placements in rank order.
    pub placed: Vec<PlannedAllocation>,
    /// Candidates left out.
    pub unplaced: Vec<UnplacedProject>,
}

/// Result of `allocate_from_ranking`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingAllocationResult {
    /// Allocations created.
    pub allocations: Vec<BudgetAllocation>,
    /// Candidates left out.
    pub unplaced: Vec<UnplacedProject>,
}

/// One write in an atomic budget batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetWrite {
    /// Insert or overwrite a cycle.
    SaveCycle(BudgetCycle),
    /// Delete a cycle and all of its allocations.
    DeleteCycle(BudgetCycleId),
    /// Insert or overwrite an allocation.
    SaveAllocation(BudgetAllocation),
    /// Delete an allocation.
    DeleteAllocation(AllocationId),
    /// Fail the batch with `StoreError::Conflict` if, after its other writes,
    /// the year's allocations exceed the cycle's funding constraint. The store
    /// keeps the cycle locked against other guarded batches until commit.
    EnsureWithinFunding {
        /// Cycle.
        cycle_id: BudgetCycleId,
        /// Constrained year.
        year: i32,
    },
}
