//! Core prioritization and capital budget logic for Keystone.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached through repository traits that the db crate implements;
//! [`memory::InMemoryStore`] implements them for tests and tooling.
//!
//! # Modules
//!
//! - `criteria` - Weighted criteria registry, normalization, model versions
//! - `scoring` - Per-project scores, status workflow, composite scores
//! - `environmental` - Green-upgrade impact scoring
//! - `ranking` - Ranking cache and what-if weighting scenarios
//! - `budget` - Multi-year capital budget cycles and allocations
//! - `audit` - Append-only criteria and scoring audit trail

pub mod audit;
pub mod budget;
pub mod criteria;
pub mod environmental;
pub mod error;
pub mod memory;
pub mod ranking;
pub mod scoring;
pub mod store;

#[cfg(test)]
mod fixtures;

pub use error::ErrorKind;
pub use store::{DataRevision, StoreError};
