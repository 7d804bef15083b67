//! `SeaORM` entity definitions.

pub mod budget_allocations;
pub mod budget_cycles;
pub mod criteria;
pub mod criteria_audit_log;
pub mod data_revisions;
pub mod green_upgrades;
pub mod model_versions;
pub mod project_scores;
pub mod ranking_cache;
pub mod scoring_audit_log;
