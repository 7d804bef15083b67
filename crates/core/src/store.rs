//! Store-level error and revision types shared by every repository trait.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a repository implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached (connection refused, pool timeout).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An optimistic commit lost against a concurrent writer.
    #[error("concurrent modification detected")]
    Conflict,

    /// Any other backend failure.
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a backend error.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Whether read paths may fall back to an empty result.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Counters bumped by every criteria commit and every score commit.
///
/// Ranking snapshots record the revision they were computed from; a mismatch
/// with the current revision means the cache is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRevision {
    /// Criteria revision.
    pub criteria: i64,
    /// Project score revision.
    pub scores: i64,
}

impl DataRevision {
    /// Creates a revision pair.
    #[must_use]
    pub const fn new(criteria: i64, scores: i64) -> Self {
        Self { criteria, scores }
    }
}
