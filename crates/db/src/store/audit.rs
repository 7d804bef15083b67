use keystone_core::audit::{AuditRepository, CriteriaAuditEntry, ScoringAuditEntry};
use keystone_core::StoreError;
use keystone_shared::types::{CriterionId, ProjectId};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use super::PgStore;
use crate::convert::{criteria_audit_from_model, scoring_audit_from_model, store_error};
use crate::entities::{criteria_audit_log, scoring_audit_log};

impl AuditRepository for PgStore {
    async fn project_scoring_audit(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ScoringAuditEntry>, StoreError> {
        scoring_audit_log::Entity::find()
            .filter(scoring_audit_log::Column::ProjectId.eq(project_id.into_inner()))
            .order_by_desc(scoring_audit_log::Column::ChangedAt)
            .order_by_desc(scoring_audit_log::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(scoring_audit_from_model)
            .collect()
    }

    async fn criteria_audit(
        &self,
        criteria_id: Option<CriterionId>,
    ) -> Result<Vec<CriteriaAuditEntry>, StoreError> {
        let mut query = criteria_audit_log::Entity::find();
        if let Some(id) = criteria_id {
            query = query.filter(criteria_audit_log::Column::CriteriaId.eq(id.into_inner()));
        }

        query
            .order_by_desc(criteria_audit_log::Column::ChangedAt)
            .order_by_desc(criteria_audit_log::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(criteria_audit_from_model)
            .collect()
    }

    async fn recent_scoring_audit(&self, limit: u64) -> Result<Vec<ScoringAuditEntry>, StoreError> {
        scoring_audit_log::Entity::find()
            .order_by_desc(scoring_audit_log::Column::ChangedAt)
            .order_by_desc(scoring_audit_log::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(scoring_audit_from_model)
            .collect()
    }

    async fn recent_criteria_audit(&self, limit: u64) -> Result<Vec<CriteriaAuditEntry>, StoreError> {
        criteria_audit_log::Entity::find()
            .order_by_desc(criteria_audit_log::Column::ChangedAt)
            .order_by_desc(criteria_audit_log::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(criteria_audit_from_model)
            .collect()
    }
}
