//! Weight normalization for the active criteria set.
//!
//! Active weights are rescaled so they sum to exactly 100.00. Each weight is
//! rounded to two decimals and the rounding residual is assigned to the single
//! largest weight (ties: lowest display order, then lowest id).

use std::cmp::Ordering;

use keystone_shared::types::CriterionId;
use rust_decimal::Decimal;

use super::types::Criterion;

/// Allowed distance of the active weight sum from 100.
pub const WEIGHT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// One active criterion as seen by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightEntry {
    /// Criterion ID.
    pub id: CriterionId,
    /// Display order (tie-break for the residual).
    pub display_order: i32,
    /// Current weight.
    pub weight: Decimal,
}

impl From<&Criterion> for WeightEntry {
    fn from(criterion: &Criterion) -> Self {
        Self {
            id: criterion.id,
            display_order: criterion.display_order,
            weight: criterion.weight,
        }
    }
}

/// Stateless weight normalizer.
pub struct WeightNormalizer;

impl WeightNormalizer {
    /// Returns the normalized weight for every entry, in input order.
    ///
    /// - No entries: empty result.
    /// - All weights zero: 100 split evenly.
    /// - Otherwise: `w * 100 / sum`, rounded to two decimals.
    #[must_use]
    pub fn normalize(entries: &[WeightEntry]) -> Vec<(CriterionId, Decimal)> {
        if entries.is_empty() {
            return Vec::new();
        }

        let total = Self::total(entries.iter().map(|e| e.weight));
        let mut weights: Vec<Decimal> = if total > Decimal::ZERO {
            entries
                .iter()
                .map(|e| (e.weight * Decimal::ONE_HUNDRED / total).round_dp(2))
                .collect()
        } else {
            let share = (Decimal::ONE_HUNDRED / Decimal::from(entries.len())).round_dp(2);
            vec![share; entries.len()]
        };

        let residual = Decimal::ONE_HUNDRED - Self::total(weights.iter().copied());
        if !residual.is_zero() {
            let target = Self::largest_index(entries, &weights);
            weights[target] += residual;
        }

        entries.iter().map(|e| e.id).zip(weights).collect()
    }

    /// Sum of weights.
    #[must_use]
    pub fn total(weights: impl IntoIterator<Item = Decimal>) -> Decimal {
        weights.into_iter().sum()
    }

    /// Whether a weight sum satisfies the invariant for `active_count` criteria.
    #[must_use]
    pub fn is_balanced(total: Decimal, active_count: usize) -> bool {
        active_count == 0 || (total - Decimal::ONE_HUNDRED).abs() <= WEIGHT_TOLERANCE
    }

    fn largest_index(entries: &[WeightEntry], weights: &[Decimal]) -> usize {
        let mut best = 0;
        for idx in 1..entries.len() {
            let ordering = weights[idx].cmp(&weights[best]).then_with(|| {
                entries[best]
                    .display_order
                    .cmp(&entries[idx].display_order)
                    .then_with(|| entries[best].id.cmp(&entries[idx].id))
            });
            if ordering == Ordering::Greater {
                best = idx;
            }
        }
        best
    }
}
