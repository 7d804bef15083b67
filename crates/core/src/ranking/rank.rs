//! Rank assignment.

use super::types::RankingEntry;
use crate::scoring::CompositeScore;

/// Orders composites into ranks 1..N.
pub struct RankAssigner;

impl RankAssigner {
    /// Sorts by descending composite, ties by ascending project id, and numbers the result.
    #[must_use]
    pub fn assign(mut composites: Vec<CompositeScore>) -> Vec<RankingEntry> {
        composites.sort_by(|a, b| {
            b.composite
                .cmp(&a.composite)
                .then_with(|| a.project_id.cmp(&b.project_id))
        });
        composites
            .into_iter()
            .zip(1u32..)
            .map(|(composite, rank)| RankingEntry {
                project_id: composite.project_id,
                composite_score: composite.composite,
                rank,
                scored_criteria: u32::try_from(composite.scored_criteria).unwrap_or(u32::MAX),
            })
            .collect()
    }
}

#[cfg(test)]
impl RankAssigner {
    /// Whether entries are in rank order with ranks 1..N and non-increasing scores.
    pub(crate) fn is_well_ordered(entries: &[RankingEntry]) -> bool {
        entries.iter().zip(1u32..).all(|(e, rank)| e.rank == rank)
            && entries.windows(2).all(|w| {
                w[0].composite_score > w[1].composite_score
                    || (w[0].composite_score == w[1].composite_score
                        && w[0].project_id < w[1].project_id)
            })
    }

    pub(crate) fn rank_of(
        entries: &[RankingEntry],
        project_id: keystone_shared::types::ProjectId,
    ) -> Option<u32> {
        entries
            .iter()
            .find(|e| e.project_id == project_id)
            .map(|e| e.rank)
    }

    pub(crate) fn top_score(entries: &[RankingEntry]) -> Option<rust_decimal::Decimal> {
        entries.first().map(|e| e.composite_score)
    }
}
