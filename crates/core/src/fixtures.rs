//! Shared fixtures for service tests.

use std::sync::Arc;

use chrono::Utc;
use keystone_shared::config::{BudgetConfig, PrioritizationConfig};
use keystone_shared::types::{Actor, CriterionId, Role, UserId};
use rust_decimal::Decimal;

use crate::criteria::{
    CriteriaCommit, CriteriaRegistry, CriteriaRepository, Criterion, CriterionCategory,
    CriterionLifecycle,
};
use crate::memory::InMemoryStore;

pub fn actor(role: Role) -> Actor {
    Actor::new(UserId::new(), role)
}

pub fn admin() -> Actor {
    actor(Role::Admin)
}

pub fn manager() -> Actor {
    actor(Role::Manager)
}

pub fn assessor() -> Actor {
    actor(Role::Assessor)
}

pub fn viewer() -> Actor {
    actor(Role::Viewer)
}

pub fn store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}

pub fn prioritization_config() -> PrioritizationConfig {
    PrioritizationConfig::default()
}

pub fn budget_config() -> BudgetConfig {
    BudgetConfig::default()
}

pub fn registry(store: &Arc<InMemoryStore>) -> CriteriaRegistry<InMemoryStore> {
    CriteriaRegistry::new(Arc::clone(store), prioritization_config())
}

/// Writes active criteria with exactly the given weights, bypassing normalization.
pub async fn seed_criteria(store: &InMemoryStore, rows: &[(&str, Decimal)]) -> Vec<Criterion> {
    let snapshot = store.load_criteria().await.expect("load criteria");
    let now = Utc::now();
    let criteria: Vec<Criterion> = rows
        .iter()
        .zip(1..)
        .map(|(&(name, weight), order)| Criterion {
            id: CriterionId::new(),
            name: name.to_string(),
            description: None,
            category: CriterionCategory::Risk,
            weight,
            scoring_guideline: None,
            lifecycle: CriterionLifecycle::Active,
            display_order: order,
            model_version_id: None,
            created_by: UserId::new(),
            created_at: now,
            updated_at: now,
        })
        .collect();
    store
        .commit_criteria(CriteriaCommit {
            expected_revision: snapshot.revision,
            upserts: criteria.clone(),
            ..CriteriaCommit::default()
        })
        .await
        .expect("seed criteria");
    criteria
}
