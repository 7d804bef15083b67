//! Working copy of the criteria set used to plan a single atomic commit.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use keystone_shared::types::{Actor, AuditEntryId, CriterionId};
use rust_decimal::Decimal;

use super::error::CriteriaError;
use super::normalization::{WeightEntry, WeightNormalizer};
use super::types::{CriteriaCommit, CriteriaSnapshot, Criterion, CriterionLifecycle, ModelVersion};
use crate::audit::{CriteriaAuditAction, CriteriaAuditEntry};

/// Mutable copy of a [`CriteriaSnapshot`] that records what changed.
#[derive(Debug)]
pub struct CriteriaDraft {
    revision: i64,
    criteria: Vec<Criterion>,
    model_versions: Vec<ModelVersion>,
    changed: BTreeSet<CriterionId>,
    purge_scores_for: Vec<CriterionId>,
    activate_model_version: Option<ModelVersion>,
    audit: Vec<CriteriaAuditEntry>,
    actor: Actor,
    now: DateTime<Utc>,
}

impl CriteriaDraft {
    /// Starts a draft from a snapshot.
    #[must_use]
    pub fn new(snapshot: &CriteriaSnapshot, actor: Actor) -> Self {
        Self {
            revision: snapshot.revision,
            criteria: snapshot.criteria.clone(),
            model_versions: snapshot.model_versions.clone(),
            changed: BTreeSet::new(),
            purge_scores_for: Vec::new(),
            activate_model_version: None,
            audit: Vec::new(),
            actor,
            now: Utc::now(),
        }
    }

    /// Timestamp applied to every change in this draft.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Looks up a criterion that is not a tombstone.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::NotFound` for unknown or permanently deleted ids.
    pub fn get(&self, id: CriterionId) -> Result<&Criterion, CriteriaError> {
        self.criteria
            .iter()
            .find(|c| c.id == id && c.lifecycle != CriterionLifecycle::PermanentlyDeleted)
            .ok_or(CriteriaError::NotFound(id))
    }

    /// Mutable lookup; marks the criterion as changed.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::NotFound` for unknown or permanently deleted ids.
    pub fn get_mut(&mut self, id: CriterionId) -> Result<&mut Criterion, CriteriaError> {
        let now = self.now;
        let criterion = self
            .criteria
            .iter_mut()
            .find(|c| c.id == id && c.lifecycle != CriterionLifecycle::PermanentlyDeleted)
            .ok_or(CriteriaError::NotFound(id))?;
        criterion.updated_at = now;
        self.changed.insert(id);
        Ok(criterion)
    }

    /// Active criteria in display order.
    #[must_use]
    pub fn active(&self) -> Vec<&Criterion> {
        let mut active: Vec<&Criterion> = self.criteria.iter().filter(|c| c.is_active()).collect();
        active.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.id.cmp(&b.id))
        });
        active
    }

    /// Rejects `name` if an active criterion other than `except` already uses it.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::DuplicateName`.
    pub fn ensure_name_available(
        &self,
        name: &str,
        except: Option<CriterionId>,
    ) -> Result<(), CriteriaError> {
        let taken = self
            .criteria
            .iter()
            .any(|c| c.is_active() && Some(c.id) != except && c.has_name(name));
        if taken {
            return Err(CriteriaError::DuplicateName(name.trim().to_string()));
        }
        Ok(())
    }

    /// Next display order after every known criterion.
    #[must_use]
    pub fn next_display_order(&self) -> i32 {
        self.criteria
            .iter()
            .map(|c| c.display_order)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// The live model version, including one activated in this draft.
    #[must_use]
    pub fn active_model_version(&self) -> Option<&ModelVersion> {
        self.activate_model_version
            .as_ref()
            .or_else(|| self.model_versions.iter().find(|v| v.is_active))
    }

    /// Adds a new criterion.
    pub fn insert(&mut self, criterion: Criterion) {
        self.changed.insert(criterion.id);
        self.criteria.push(criterion);
    }

    /// Marks a criterion's scores for deletion.
    pub fn purge_scores(&mut self, id: CriterionId) {
        self.purge_scores_for.push(id);
    }

    /// Activates a new model version and re-tags every active criterion with it.
    pub fn activate_model_version(&mut self, version: ModelVersion) {
        let active_ids: Vec<CriterionId> = self.active().iter().map(|c| c.id).collect();
        for id in active_ids {
            let version_id = version.id;
            let now = self.now;
            if let Some(criterion) = self.criteria.iter_mut().find(|c| c.id == id) {
                criterion.model_version_id = Some(version_id);
                criterion.updated_at = now;
                let snapshot = criterion.clone();
                self.changed.insert(id);
                self.record(CriteriaAuditAction::ModelVersionTagged, &snapshot, &snapshot);
            }
        }
        self.activate_model_version = Some(version);
    }

    /// Appends an audit row describing `before` → `after`.
    pub fn record(&mut self, action: CriteriaAuditAction, before: &Criterion, after: &Criterion) {
        self.audit.push(CriteriaAuditEntry {
            id: AuditEntryId::new(),
            criteria_id: after.id,
            action,
            old_name: Some(before.name.clone()),
            new_name: Some(after.name.clone()),
            old_weight: Some(before.weight),
            new_weight: Some(after.weight),
            old_lifecycle: Some(before.lifecycle),
            new_lifecycle: Some(after.lifecycle),
            changed_by: self.actor.user_id,
            changed_at: self.now,
        });
    }

    /// Appends an audit row for a criterion that did not exist before.
    pub fn record_created(&mut self, after: &Criterion) {
        self.audit.push(CriteriaAuditEntry {
            id: AuditEntryId::new(),
            criteria_id: after.id,
            action: CriteriaAuditAction::Created,
            old_name: None,
            new_name: Some(after.name.clone()),
            old_weight: None,
            new_weight: Some(after.weight),
            old_lifecycle: None,
            new_lifecycle: Some(after.lifecycle),
            changed_by: self.actor.user_id,
            changed_at: self.now,
        });
    }

    /// Renormalizes the active set and audits every weight it moved.
    ///
    /// Returns the number of criteria whose weight changed.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::WeightInvariant` if the result does not sum to 100.
    pub fn normalize(&mut self) -> Result<usize, CriteriaError> {
        let entries: Vec<WeightEntry> = self.active().into_iter().map(WeightEntry::from).collect();
        let normalized = WeightNormalizer::normalize(&entries);

        let mut moved = 0;
        for (id, weight) in normalized {
            let now = self.now;
            let Some(criterion) = self.criteria.iter_mut().find(|c| c.id == id) else {
                continue;
            };
            if criterion.weight == weight {
                continue;
            }
            let before = criterion.clone();
            criterion.weight = weight;
            criterion.updated_at = now;
            let after = criterion.clone();
            self.changed.insert(id);
            self.record(CriteriaAuditAction::WeightNormalized, &before, &after);
            moved += 1;
        }

        self.verify()?;
        Ok(moved)
    }

    /// Checks the weight invariant on the active set.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::WeightInvariant` if the sum is off.
    pub fn verify(&self) -> Result<(), CriteriaError> {
        let active = self.active();
        let total: Decimal = WeightNormalizer::total(active.iter().map(|c| c.weight));
        if WeightNormalizer::is_balanced(total, active.len()) {
            Ok(())
        } else {
            Err(CriteriaError::WeightInvariant { total })
        }
    }

    /// Finds a criterion by name (case-insensitive) in the given lifecycle state.
    #[must_use]
    pub fn find_by_name(&self, name: &str, lifecycle: CriterionLifecycle) -> Option<&Criterion> {
        self.criteria
            .iter()
            .filter(|c| c.lifecycle == lifecycle && c.has_name(name))
            .max_by_key(|c| c.updated_at)
    }

    /// Turns the draft into a commit for the store.
    #[must_use]
    pub fn into_commit(self) -> CriteriaCommit {
        let upserts = self
            .criteria
            .into_iter()
            .filter(|c| self.changed.contains(&c.id))
            .collect();
        CriteriaCommit {
            expected_revision: self.revision,
            upserts,
            purge_scores_for: self.purge_scores_for,
            activate_model_version: self.activate_model_version,
            audit: self.audit,
        }
    }
}
