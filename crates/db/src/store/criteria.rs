use keystone_core::criteria::{CriteriaCommit, CriteriaRepository, CriteriaSnapshot};
use keystone_core::StoreError;
use keystone_shared::types::CriterionId;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    AccessMode, ColumnTrait, EntityTrait, IsolationLevel, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::debug;

use super::{read_revisions, PgStore};
use crate::convert::{
    criteria_audit_to_active, criterion_from_model, criterion_to_active,
    model_version_from_model, model_version_to_active, store_error,
};
use crate::entities::{criteria, criteria_audit_log, data_revisions, model_versions, project_scores};

impl CriteriaRepository for PgStore {
    async fn load_criteria(&self) -> Result<CriteriaSnapshot, StoreError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), Some(AccessMode::ReadOnly))
            .await
            .map_err(store_error)?;

        let revisions = read_revisions(&txn).await?;

        let criteria = criteria::Entity::find()
            .order_by_asc(criteria::Column::DisplayOrder)
            .order_by_asc(criteria::Column::Name)
            .all(&txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(criterion_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        let model_versions = model_versions::Entity::find()
            .order_by_asc(model_versions::Column::CreatedAt)
            .all(&txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(model_version_from_model)
            .collect();

        txn.commit().await.map_err(store_error)?;

        Ok(CriteriaSnapshot {
            revision: revisions.criteria_revision,
            criteria,
            model_versions,
        })
    }

    async fn commit_criteria(&self, commit: CriteriaCommit) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(store_error)?;

        // Claim the revision first; losers see zero rows and back out.
        let claimed = data_revisions::Entity::update_many()
            .col_expr(
                data_revisions::Column::CriteriaRevision,
                Expr::col(data_revisions::Column::CriteriaRevision).add(1),
            )
            .filter(data_revisions::Column::Id.eq(data_revisions::SINGLETON_ID))
            .filter(data_revisions::Column::CriteriaRevision.eq(commit.expected_revision))
            .exec(&txn)
            .await
            .map_err(store_error)?;

        if claimed.rows_affected != 1 {
            txn.rollback().await.map_err(store_error)?;
            debug!(expected = commit.expected_revision, "Criteria commit lost revision race");
            return Err(StoreError::Conflict);
        }

        if let Some(version) = &commit.activate_model_version {
            model_versions::Entity::update_many()
                .col_expr(model_versions::Column::IsActive, Expr::value(false))
                .filter(model_versions::Column::IsActive.eq(true))
                .exec(&txn)
                .await
                .map_err(store_error)?;

            model_versions::Entity::insert(model_version_to_active(version))
                .exec(&txn)
                .await
                .map_err(store_error)?;
        }

        if !commit.upserts.is_empty() {
            criteria::Entity::insert_many(commit.upserts.iter().map(criterion_to_active))
                .on_conflict(
                    OnConflict::column(criteria::Column::Id)
                        .update_columns([
                            criteria::Column::Name,
                            criteria::Column::Description,
                            criteria::Column::Category,
                            criteria::Column::Weight,
                            criteria::Column::ScoringGuideline,
                            criteria::Column::Lifecycle,
                            criteria::Column::DisplayOrder,
                            criteria::Column::ModelVersionId,
                            criteria::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec(&txn)
                .await
                .map_err(store_error)?;
        }

        if !commit.purge_scores_for.is_empty() {
            project_scores::Entity::delete_many()
                .filter(
                    project_scores::Column::CriteriaId
                        .is_in(commit.purge_scores_for.iter().map(|id| CriterionId::into_inner(*id))),
                )
                .exec(&txn)
                .await
                .map_err(store_error)?;

            data_revisions::Entity::update_many()
                .col_expr(
                    data_revisions::Column::ScoreRevision,
                    Expr::col(data_revisions::Column::ScoreRevision).add(1),
                )
                .filter(data_revisions::Column::Id.eq(data_revisions::SINGLETON_ID))
                .exec(&txn)
                .await
                .map_err(store_error)?;
        }

        if !commit.audit.is_empty() {
            criteria_audit_log::Entity::insert_many(commit.audit.iter().map(criteria_audit_to_active))
                .exec(&txn)
                .await
                .map_err(store_error)?;
        }

        txn.commit().await.map_err(store_error)?;
        Ok(())
    }
}
