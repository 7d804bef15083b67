//! Weighted prioritization criteria.
//!
//! The active set always sums to 100 percentage points. Every mutation plans
//! its change on a [`CriteriaDraft`], renormalizes and commits criteria rows,
//! audit rows and model-version changes as one optimistic write.

mod draft;
mod error;
mod normalization;
mod registry;
mod types;

#[cfg(test)]
mod normalization_props;

pub use draft::CriteriaDraft;
pub use error::CriteriaError;
pub use normalization::{WEIGHT_TOLERANCE, WeightEntry, WeightNormalizer};
pub use registry::{CriteriaRegistry, CriteriaRepository};
pub use types::{
    CreateCriterionInput, CriteriaCommit, CriteriaSnapshot, Criterion, CriterionCategory,
    CriterionLifecycle, ModelVersion, UpdateCriterionInput, WeightValidation,
};
