//! Budget rules: clamping, year bounds, funding caps and escalation.

use std::collections::BTreeSet;

use keystone_shared::types::AllocationId;
use rust_decimal::Decimal;

use super::error::BudgetError;
use super::types::{BudgetAllocation, BudgetCycle, BudgetSummary, FundingConstraint, YearSummary};

/// Shortest cycle, in years.
pub const MIN_DURATION_YEARS: i32 = 1;
/// Longest cycle, in years.
pub const MAX_DURATION_YEARS: i32 = 30;
/// Earliest accepted start year.
pub const MIN_START_YEAR: i32 = 1900;
/// Latest accepted start year.
pub const MAX_START_YEAR: i32 = 2200;

/// Largest money amount a cycle, allocation or cost may carry (`NUMERIC(15,2)`).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 2);

const FACTOR_SCALE: u32 = 10;

/// Stateless budget rules shared by the engine and the planner.
pub struct BudgetService;

impl BudgetService {
    /// Clamps a requested duration to 1–30 years.
    #[must_use]
    pub fn clamp_duration(years: i32) -> i32 {
        years.clamp(MIN_DURATION_YEARS, MAX_DURATION_YEARS)
    }

    /// Clamps an inflation or escalation percent to 0–20.
    #[must_use]
    pub fn clamp_rate(rate: Decimal) -> Decimal {
        rate.clamp(Decimal::ZERO, Decimal::from(20))
    }

    /// Last year of a cycle.
    #[must_use]
    pub const fn end_year(start_year: i32, duration_years: i32) -> i32 {
        start_year + duration_years - 1
    }

    /// Validates a start year.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::Validation` outside 1900–2200.
    pub fn validate_start_year(year: i32) -> Result<i32, BudgetError> {
        if (MIN_START_YEAR..=MAX_START_YEAR).contains(&year) {
            Ok(year)
        } else {
            Err(BudgetError::validation(
                "start_year",
                format!("{year} is outside {MIN_START_YEAR}-{MAX_START_YEAR}"),
            ))
        }
    }

    /// Validates a money amount and rounds it to cents.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::Validation` for negative amounts and amounts above
    /// [`MAX_AMOUNT`].
    pub fn validate_amount(field: &'static str, amount: Decimal) -> Result<Decimal, BudgetError> {
        if amount < Decimal::ZERO {
            return Err(BudgetError::validation(field, "must not be negative"));
        }
        let amount = amount.round_dp(2);
        if amount > MAX_AMOUNT {
            return Err(BudgetError::validation(field, format!("must not exceed {MAX_AMOUNT}")));
        }
        Ok(amount)
    }

    /// Validates funding constraints against the cycle years and sorts them by year.
    ///
    /// # Errors
    ///
    /// Returns an error if a year is outside the cycle or repeated, or an amount is negative.
    pub fn normalize_constraints(
        start_year: i32,
        end_year: i32,
        constraints: Vec<FundingConstraint>,
    ) -> Result<Vec<FundingConstraint>, BudgetError> {
        let mut seen = BTreeSet::new();
        let mut normalized = Vec::with_capacity(constraints.len());
        for constraint in constraints {
            if constraint.year < start_year || constraint.year > end_year {
                return Err(BudgetError::YearOutOfRange {
                    year: constraint.year,
                    start_year,
                    end_year,
                });
            }
            if !seen.insert(constraint.year) {
                return Err(BudgetError::validation(
                    "funding_constraints",
                    format!("year {} is constrained more than once", constraint.year),
                ));
            }
            normalized.push(FundingConstraint {
                year: constraint.year,
                max_amount: Self::validate_amount("funding_constraints", constraint.max_amount)?,
            });
        }
        normalized.sort_by_key(|c| c.year);
        Ok(normalized)
    }

    /// Checks that a year lies inside the cycle.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::YearOutOfRange`.
    pub const fn validate_year(cycle: &BudgetCycle, year: i32) -> Result<i32, BudgetError> {
        if cycle.contains_year(year) {
            Ok(year)
        } else {
            Err(BudgetError::YearOutOfRange {
                year,
                start_year: cycle.start_year,
                end_year: cycle.end_year,
            })
        }
    }

    /// Checks that the cycle still accepts allocation changes.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::CycleClosed` for completed and archived cycles.
    pub const fn ensure_open(cycle: &BudgetCycle) -> Result<(), BudgetError> {
        if cycle.status.accepts_allocation_changes() {
            Ok(())
        } else {
            Err(BudgetError::CycleClosed {
                id: cycle.id,
                status: cycle.status,
            })
        }
    }

    /// Compounded cost growth from the start year to `year`.
    ///
    /// `(1 + (inflation + escalation) / 100) ^ (year - start_year)`; 1 for years
    /// at or before the start.
    #[must_use]
    pub fn escalation_factor(cycle: &BudgetCycle, year: i32) -> Decimal {
        let step = Decimal::ONE + (cycle.inflation_rate + cycle.escalation_rate) / Decimal::ONE_HUNDRED;
        let mut factor = Decimal::ONE;
        for _ in cycle.start_year..year {
            factor = (factor * step).round_dp(FACTOR_SCALE);
        }
        factor
    }

    /// Escalates a start-year cost to `year`, rounded to cents.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::Overflow` if the product leaves the decimal range.
    pub fn escalate(cycle: &BudgetCycle, cost: Decimal, year: i32) -> Result<Decimal, BudgetError> {
        cost.checked_mul(Self::escalation_factor(cycle, year))
            .map(|amount| amount.round_dp(2))
            .ok_or(BudgetError::Overflow("escalated cost"))
    }

    /// Sum of allocations in a year, optionally leaving one allocation out.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::Overflow` if the total leaves the decimal range.
    pub fn year_total(
        allocations: &[BudgetAllocation],
        year: i32,
        excluding: Option<AllocationId>,
    ) -> Result<Decimal, BudgetError> {
        checked_sum(
            allocations
                .iter()
                .filter(|a| a.year == year && Some(a.id) != excluding)
                .map(|a| a.allocated_amount),
            "year total",
        )
    }

    /// Checks that adding `amount` to `year` stays within its funding constraint.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::FundingConstraintExceeded` on overrun and
    /// `BudgetError::Overflow` if the total leaves the decimal range.
    pub fn check_funding(
        cycle: &BudgetCycle,
        allocations: &[BudgetAllocation],
        year: i32,
        amount: Decimal,
        excluding: Option<AllocationId>,
    ) -> Result<(), BudgetError> {
        let Some(constraint) = cycle.constraint_for(year) else {
            return Ok(());
        };
        let total = Self::year_total(allocations, year, excluding)?
            .checked_add(amount)
            .ok_or(BudgetError::Overflow("year total"))?;
        if total > constraint {
            return Err(BudgetError::FundingConstraintExceeded {
                year,
                constraint,
                total,
            });
        }
        Ok(())
    }

    /// Per-year and whole-cycle totals.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::Overflow` if a total leaves the decimal range.
    pub fn summarize(cycle: &BudgetCycle, allocations: &[BudgetAllocation]) -> Result<BudgetSummary, BudgetError> {
        let years = cycle
            .years()
            .map(|year| {
                let allocation_count = allocations.iter().filter(|a| a.year == year).count();
                let allocated = Self::year_total(allocations, year, None)?;
                let escalation_factor = Self::escalation_factor(cycle, year);
                let constraint = cycle.constraint_for(year);
                Ok(YearSummary {
                    year,
                    allocated,
                    allocation_count,
                    escalation_factor,
                    base_year_amount: (allocated / escalation_factor).round_dp(2),
                    constraint,
                    headroom: constraint.map(|c| c - allocated),
                    over_constraint: constraint.is_some_and(|c| allocated > c),
                })
            })
            .collect::<Result<Vec<YearSummary>, BudgetError>>()?;

        let total_allocated = checked_sum(allocations.iter().map(|a| a.allocated_amount), "cycle total")?;
        Ok(BudgetSummary {
            cycle_id: cycle.id,
            total_budget: cycle.total_budget,
            total_allocated,
            remaining_budget: cycle.total_budget - total_allocated,
            allocation_count: allocations.len(),
            has_overrun: years.iter().any(|y| y.over_constraint),
            years,
        })
    }
}

/// Adds amounts, failing instead of panicking when the sum leaves the decimal range.
pub(crate) fn checked_sum(
    amounts: impl IntoIterator<Item = Decimal>,
    what: &'static str,
) -> Result<Decimal, BudgetError> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or(BudgetError::Overflow(what))
}
