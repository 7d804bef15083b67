//! Criteria registry: weighted criteria, normalization and model versions.

use std::future::Future;
use std::sync::Arc;

use keystone_shared::config::PrioritizationConfig;
use keystone_shared::types::{Actor, CriterionId, ModelVersionId};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::draft::CriteriaDraft;
use super::error::CriteriaError;
use super::normalization::WeightNormalizer;
use super::types::{
    CreateCriterionInput, CriteriaCommit, CriteriaSnapshot, Criterion, CriterionCategory,
    CriterionLifecycle, ModelVersion, UpdateCriterionInput, WeightValidation,
};
use crate::audit::CriteriaAuditAction;
use crate::store::StoreError;

/// Repository trait for criteria persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait CriteriaRepository: Send + Sync {
    /// Reads every criterion and model version at the current criteria revision.
    fn load_criteria(&self) -> impl Future<Output = Result<CriteriaSnapshot, StoreError>> + Send;

    /// Applies a commit atomically.
    ///
    /// Returns `StoreError::Conflict` if the criteria revision moved past
    /// `commit.expected_revision`.
    fn commit_criteria(
        &self,
        commit: CriteriaCommit,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Default criteria installed by [`CriteriaRegistry::seed_default_criteria`].
const DEFAULT_CRITERIA: [(&str, CriterionCategory, i64, &str); 5] = [
    (
        "Life Safety & Risk",
        CriterionCategory::Risk,
        25,
        "10 = imminent life-safety hazard or failure; 0 = no identifiable risk.",
    ),
    (
        "Regulatory Compliance",
        CriterionCategory::Compliance,
        20,
        "10 = active code violation or order; 0 = fully compliant.",
    ),
    (
        "Strategic Alignment",
        CriterionCategory::Strategic,
        15,
        "10 = named in the capital plan; 0 = no strategic driver.",
    ),
    (
        "Financial Impact",
        CriterionCategory::Financial,
        15,
        "10 = large cost avoidance or payback under 3 years; 0 = none.",
    ),
    (
        "Operational Impact",
        CriterionCategory::Operational,
        15,
        "10 = building cannot operate without it; 0 = cosmetic.",
    ),
];

const ENVIRONMENTAL_GUIDELINE: &str =
    "Scored automatically from annual GHG reduction (t CO2e/yr).";

/// Criteria registry service.
pub struct CriteriaRegistry<R: CriteriaRepository> {
    repo: Arc<R>,
    config: PrioritizationConfig,
}

impl<R: CriteriaRepository> Clone for CriteriaRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: self.config.clone(),
        }
    }
}

impl<R: CriteriaRepository> CriteriaRegistry<R> {
    /// Create a new criteria registry.
    #[must_use]
    pub fn new(repo: Arc<R>, config: PrioritizationConfig) -> Self {
        Self { repo, config }
    }

    /// Lists criteria in display order. Tombstones are never returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_criteria(&self, include_inactive: bool) -> Result<Vec<Criterion>, CriteriaError> {
        let snapshot = self.repo.load_criteria().await?;
        let mut criteria: Vec<Criterion> = snapshot
            .criteria
            .into_iter()
            .filter(|c| match c.lifecycle {
                CriterionLifecycle::Active => true,
                CriterionLifecycle::Inactive => include_inactive,
                CriterionLifecycle::PermanentlyDeleted => false,
            })
            .collect();
        criteria.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(criteria)
    }

    /// Gets a criterion by ID.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::NotFound` for unknown or permanently deleted ids.
    pub async fn get_criterion(&self, id: CriterionId) -> Result<Criterion, CriteriaError> {
        let snapshot = self.repo.load_criteria().await?;
        snapshot
            .find(id)
            .filter(|c| c.lifecycle != CriterionLifecycle::PermanentlyDeleted)
            .cloned()
            .ok_or(CriteriaError::NotFound(id))
    }

    /// Creates a criterion and renormalizes the active set.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller is not an admin
    /// - Name is empty or weight is outside 0–100
    /// - An active criterion already uses the name
    pub async fn create_criteria(
        &self,
        actor: &Actor,
        input: CreateCriterionInput,
    ) -> Result<Criterion, CriteriaError> {
        if !actor.is_admin() {
            return Err(CriteriaError::PermissionDenied("create criteria"));
        }
        let name = validate_name(&input.name)?;
        let weight = validate_weight(input.weight)?;

        let created = self
            .mutate(actor, |draft| {
                draft.ensure_name_available(&name, None)?;
                let now = draft.now();
                let criterion = Criterion {
                    id: CriterionId::new(),
                    name: name.clone(),
                    description: input.description.clone(),
                    category: input.category,
                    weight,
                    scoring_guideline: input.scoring_guideline.clone(),
                    lifecycle: CriterionLifecycle::Active,
                    display_order: input.display_order.unwrap_or_else(|| draft.next_display_order()),
                    model_version_id: draft.active_model_version().map(|v| v.id),
                    created_by: actor.user_id,
                    created_at: now,
                    updated_at: now,
                };
                let id = criterion.id;
                draft.record_created(&criterion);
                draft.insert(criterion);
                draft.normalize()?;
                Ok(draft.get(id)?.clone())
            })
            .await?;

        info!(criteria_id = %created.id, name = %created.name, weight = %created.weight, "Criterion created");
        Ok(created)
    }

    /// Updates a criterion. Renormalizes only when the weight changed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller cannot manage criteria
    /// - The criterion is unknown or permanently deleted
    /// - The new name collides with another active criterion
    /// - The new weight is outside 0–100
    pub async fn update_criteria(
        &self,
        actor: &Actor,
        id: CriterionId,
        input: UpdateCriterionInput,
    ) -> Result<Criterion, CriteriaError> {
        if !actor.can_manage() {
            return Err(CriteriaError::PermissionDenied("update criteria"));
        }
        let name = input.name.as_deref().map(validate_name).transpose()?;
        let weight = input.weight.map(validate_weight).transpose()?;

        let updated = self
            .mutate(actor, |draft| {
                let before = draft.get(id)?.clone();
                if let Some(name) = &name {
                    if before.is_active() && !before.has_name(name) {
                        draft.ensure_name_available(name, Some(id))?;
                    }
                }

                let criterion = draft.get_mut(id)?;
                if let Some(name) = &name {
                    criterion.name.clone_from(name);
                }
                if let Some(description) = &input.description {
                    criterion.description.clone_from(description);
                }
                if let Some(category) = input.category {
                    criterion.category = category;
                }
                if let Some(guideline) = &input.scoring_guideline {
                    criterion.scoring_guideline.clone_from(guideline);
                }
                if let Some(order) = input.display_order {
                    criterion.display_order = order;
                }
                let weight_changed = weight.is_some_and(|w| w != before.weight);
                if let Some(weight) = weight {
                    criterion.weight = weight;
                }
                let after = criterion.clone();
                draft.record(CriteriaAuditAction::Updated, &before, &after);

                if weight_changed && after.is_active() {
                    draft.normalize()?;
                }
                Ok(draft.get(id)?.clone())
            })
            .await?;

        info!(criteria_id = %id, "Criterion updated");
        Ok(updated)
    }

    /// Soft-deletes a criterion and renormalizes the remaining active set.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller cannot manage criteria or the criterion is not active.
    pub async fn delete_criteria(
        &self,
        actor: &Actor,
        id: CriterionId,
    ) -> Result<Criterion, CriteriaError> {
        if !actor.can_manage() {
            return Err(CriteriaError::PermissionDenied("delete criteria"));
        }

        let deleted = self
            .mutate(actor, |draft| {
                let before = draft.get(id)?.clone();
                if !before.is_active() {
                    return Err(CriteriaError::InvalidLifecycle {
                        id,
                        lifecycle: before.lifecycle,
                        action: "deactivate",
                    });
                }
                let criterion = draft.get_mut(id)?;
                criterion.lifecycle = CriterionLifecycle::Inactive;
                let after = criterion.clone();
                draft.record(CriteriaAuditAction::Deactivated, &before, &after);
                draft.normalize()?;
                Ok(draft.get(id)?.clone())
            })
            .await?;

        info!(criteria_id = %id, "Criterion deactivated");
        Ok(deleted)
    }

    /// Restores a soft-deleted criterion and renormalizes.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller cannot manage criteria, the criterion is not
    /// inactive, or an active criterion took its name in the meantime.
    pub async fn reactivate_criteria(
        &self,
        actor: &Actor,
        id: CriterionId,
    ) -> Result<Criterion, CriteriaError> {
        if !actor.can_manage() {
            return Err(CriteriaError::PermissionDenied("reactivate criteria"));
        }

        let reactivated = self
            .mutate(actor, |draft| reactivate_in(draft, id))
            .await?;

        info!(criteria_id = %id, "Criterion reactivated");
        Ok(reactivated)
    }

    /// Permanently deletes a criterion and its project scores.
    ///
    /// `confirmation` must equal the criterion's current name.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin, the confirmation does not
    /// match, or the criterion is unknown.
    pub async fn permanently_delete_criteria(
        &self,
        actor: &Actor,
        id: CriterionId,
        confirmation: &str,
    ) -> Result<(), CriteriaError> {
        if !actor.is_admin() {
            return Err(CriteriaError::PermissionDenied("permanently delete criteria"));
        }

        self.mutate(actor, |draft| {
            let before = draft.get(id)?.clone();
            if confirmation != before.name {
                return Err(CriteriaError::ConfirmationMismatch);
            }
            let criterion = draft.get_mut(id)?;
            criterion.lifecycle = CriterionLifecycle::PermanentlyDeleted;
            let after = criterion.clone();
            draft.record(CriteriaAuditAction::PermanentlyDeleted, &before, &after);
            draft.purge_scores(id);
            if before.is_active() {
                draft.normalize()?;
            }
            Ok(())
        })
        .await?;

        warn!(criteria_id = %id, actor = %actor.user_id, "Criterion permanently deleted");
        Ok(())
    }

    /// Renormalizes the active set. A balanced set is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller cannot manage criteria or the store fails.
    pub async fn normalize_weights(&self, actor: &Actor) -> Result<Vec<Criterion>, CriteriaError> {
        if !actor.can_manage() {
            return Err(CriteriaError::PermissionDenied("normalize weights"));
        }

        self.mutate(actor, |draft| {
            draft.normalize()?;
            Ok(())
        })
        .await?;

        self.list_criteria(false).await
    }

    /// Reports the active weight sum and whether it satisfies the invariant.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn validate_weights(&self) -> Result<WeightValidation, CriteriaError> {
        let snapshot = self.repo.load_criteria().await?;
        let active = snapshot.active();
        let total = WeightNormalizer::total(active.iter().map(|c| c.weight));
        Ok(WeightValidation {
            total,
            active_count: active.len(),
            is_valid: WeightNormalizer::is_balanced(total, active.len()),
        })
    }

    /// Returns the active environmental criterion, provisioning or reactivating it.
    ///
    /// Runs as the system actor.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn ensure_environmental_criteria(&self) -> Result<Criterion, CriteriaError> {
        let actor = Actor::system();
        let name = self.config.environmental_criterion_name.trim().to_string();
        let weight = Decimal::from(self.config.environmental_default_weight);

        self.mutate(&actor, |draft| {
            let existing = draft
                .active()
                .into_iter()
                .find(|c| c.has_name(&name))
                .cloned();
            if let Some(criterion) = existing {
                return Ok(criterion);
            }

            let dormant = draft
                .find_by_name(&name, CriterionLifecycle::Inactive)
                .map(|c| c.id);
            if let Some(id) = dormant {
                return reactivate_in(draft, id);
            }

            let now = draft.now();
            let criterion = Criterion {
                id: CriterionId::new(),
                name: name.clone(),
                description: Some(
                    "Greenhouse gas, energy and water reductions from planned green upgrades."
                        .to_string(),
                ),
                category: CriterionCategory::Environmental,
                weight,
                scoring_guideline: Some(ENVIRONMENTAL_GUIDELINE.to_string()),
                lifecycle: CriterionLifecycle::Active,
                display_order: draft.next_display_order(),
                model_version_id: draft.active_model_version().map(|v| v.id),
                created_by: actor.user_id,
                created_at: now,
                updated_at: now,
            };
            let id = criterion.id;
            draft.record_created(&criterion);
            draft.insert(criterion);
            draft.normalize()?;
            Ok(draft.get(id)?.clone())
        })
        .await
    }

    /// Installs the default criteria set when no criteria are active.
    ///
    /// Returns the criteria that were created (empty when the set already existed).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the store fails.
    pub async fn seed_default_criteria(&self, actor: &Actor) -> Result<Vec<Criterion>, CriteriaError> {
        if !actor.is_admin() {
            return Err(CriteriaError::PermissionDenied("seed default criteria"));
        }
        let environmental_name = self.config.environmental_criterion_name.trim().to_string();
        let environmental_weight = i64::from(self.config.environmental_default_weight);

        let created = self
            .mutate(actor, |draft| {
                if !draft.active().is_empty() {
                    return Ok(Vec::new());
                }
                let now = draft.now();
                let version_id = draft.active_model_version().map(|v| v.id);
                let environmental = (
                    environmental_name.clone(),
                    CriterionCategory::Environmental,
                    environmental_weight,
                    ENVIRONMENTAL_GUIDELINE.to_string(),
                );
                let defaults = DEFAULT_CRITERIA
                    .iter()
                    .map(|&(name, category, weight, guideline)| {
                        (name.to_string(), category, weight, guideline.to_string())
                    })
                    .chain(std::iter::once(environmental));

                let mut ids = Vec::new();
                for (order, (name, category, weight, guideline)) in defaults.enumerate() {
                    let criterion = Criterion {
                        id: CriterionId::new(),
                        name,
                        description: None,
                        category,
                        weight: Decimal::from(weight),
                        scoring_guideline: Some(guideline),
                        lifecycle: CriterionLifecycle::Active,
                        display_order: i32::try_from(order + 1).unwrap_or(i32::MAX),
                        model_version_id: version_id,
                        created_by: actor.user_id,
                        created_at: now,
                        updated_at: now,
                    };
                    ids.push(criterion.id);
                    draft.record_created(&criterion);
                    draft.insert(criterion);
                }
                draft.normalize()?;
                ids.into_iter()
                    .map(|id| draft.get(id).cloned())
                    .collect::<Result<Vec<_>, _>>()
            })
            .await?;

        info!(count = created.len(), "Default criteria seeded");
        Ok(created)
    }

    /// Creates a new live model version and re-tags the active criteria with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the name is empty.
    pub async fn create_model_version(
        &self,
        actor: &Actor,
        name: &str,
        description: Option<String>,
    ) -> Result<ModelVersion, CriteriaError> {
        if !actor.is_admin() {
            return Err(CriteriaError::PermissionDenied("create model version"));
        }
        let name = validate_name(name)?;

        let version = self
            .mutate(actor, |draft| {
                let version = ModelVersion {
                    id: ModelVersionId::new(),
                    name: name.clone(),
                    description: description.clone(),
                    is_active: true,
                    created_by: actor.user_id,
                    created_at: draft.now(),
                };
                draft.activate_model_version(version.clone());
                Ok(version)
            })
            .await?;

        info!(model_version_id = %version.id, name = %version.name, "Model version activated");
        Ok(version)
    }

    /// Returns the live model version, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_active_model_version(&self) -> Result<Option<ModelVersion>, CriteriaError> {
        let snapshot = self.repo.load_criteria().await?;
        Ok(snapshot.active_model_version().cloned())
    }

    /// Lists model versions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_model_versions(&self) -> Result<Vec<ModelVersion>, CriteriaError> {
        let mut versions = self.repo.load_criteria().await?.model_versions;
        versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(versions)
    }

    /// Plans a change against a fresh snapshot and commits it, retrying when a
    /// concurrent writer commits first.
    async fn mutate<T, F>(&self, actor: &Actor, mut plan: F) -> Result<T, CriteriaError>
    where
        F: FnMut(&mut CriteriaDraft) -> Result<T, CriteriaError>,
    {
        let attempts = self.config.max_commit_retries.saturating_add(1);
        for attempt in 1..=attempts {
            let snapshot = self.repo.load_criteria().await?;
            let mut draft = CriteriaDraft::new(&snapshot, *actor);
            let output = plan(&mut draft)?;
            let commit = draft.into_commit();
            if commit.is_empty() {
                return Ok(output);
            }

            match self.repo.commit_criteria(commit).await {
                Ok(()) => return Ok(output),
                Err(StoreError::Conflict) => {
                    warn!(attempt, revision = snapshot.revision, "Criteria commit conflicted, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(CriteriaError::ConcurrentModification { attempts })
    }
}

/// Reactivation shared by `reactivate_criteria` and environmental provisioning.
fn reactivate_in(draft: &mut CriteriaDraft, id: CriterionId) -> Result<Criterion, CriteriaError> {
    let before = draft.get(id)?.clone();
    if before.lifecycle != CriterionLifecycle::Inactive {
        return Err(CriteriaError::InvalidLifecycle {
            id,
            lifecycle: before.lifecycle,
            action: "reactivate",
        });
    }
    draft.ensure_name_available(&before.name, Some(id))?;
    let version_id = draft.active_model_version().map(|v| v.id);
    let criterion = draft.get_mut(id)?;
    criterion.lifecycle = CriterionLifecycle::Active;
    if version_id.is_some() {
        criterion.model_version_id = version_id;
    }
    let after = criterion.clone();
    draft.record(CriteriaAuditAction::Reactivated, &before, &after);
    draft.normalize()?;
    Ok(draft.get(id)?.clone())
}

fn validate_name(name: &str) -> Result<String, CriteriaError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CriteriaError::validation("name", "must not be empty"));
    }
    if trimmed.chars().count() > 200 {
        return Err(CriteriaError::validation("name", "must be at most 200 characters"));
    }
    Ok(trimmed.to_string())
}

fn validate_weight(weight: Decimal) -> Result<Decimal, CriteriaError> {
    if weight < Decimal::ZERO || weight > Decimal::ONE_HUNDRED {
        return Err(CriteriaError::validation(
            "weight",
            format!("{weight} is outside 0-100"),
        ));
    }
    Ok(weight.round_dp(2))
}
