use keystone_core::scoring::{ProjectScore, ScoreCommit, ScoreRepository};
use keystone_core::StoreError;
use keystone_shared::types::ProjectId;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};

use super::PgStore;
use crate::convert::{score_from_model, score_to_active, scoring_audit_to_active, store_error};
use crate::entities::{data_revisions, project_scores, scoring_audit_log};

impl ScoreRepository for PgStore {
    async fn list_project_scores(&self, project_id: ProjectId) -> Result<Vec<ProjectScore>, StoreError> {
        project_scores::Entity::find()
            .filter(project_scores::Column::ProjectId.eq(project_id.into_inner()))
            .order_by_asc(project_scores::Column::CriteriaId)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(score_from_model)
            .collect()
    }

    async fn list_all_scores(&self) -> Result<Vec<ProjectScore>, StoreError> {
        project_scores::Entity::find()
            .order_by_asc(project_scores::Column::ProjectId)
            .order_by_asc(project_scores::Column::CriteriaId)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(score_from_model)
            .collect()
    }

    async fn commit_scores(&self, commit: ScoreCommit) -> Result<(), StoreError> {
        if commit.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await.map_err(store_error)?;

        project_scores::Entity::insert_many(commit.upserts.iter().map(score_to_active))
            .on_conflict(
                OnConflict::columns([
                    project_scores::Column::ProjectId,
                    project_scores::Column::CriteriaId,
                ])
                .update_columns([
                    project_scores::Column::Score,
                    project_scores::Column::Justification,
                    project_scores::Column::Status,
                    project_scores::Column::ScoredBy,
                    project_scores::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec(&txn)
            .await
            .map_err(store_error)?;

        if !commit.audit.is_empty() {
            scoring_audit_log::Entity::insert_many(commit.audit.iter().map(scoring_audit_to_active))
                .exec(&txn)
                .await
                .map_err(store_error)?;
        }

        data_revisions::Entity::update_many()
            .col_expr(
                data_revisions::Column::ScoreRevision,
                Expr::col(data_revisions::Column::ScoreRevision).add(1),
            )
            .filter(data_revisions::Column::Id.eq(data_revisions::SINGLETON_ID))
            .exec(&txn)
            .await
            .map_err(store_error)?;

        txn.commit().await.map_err(store_error)?;
        Ok(())
    }
}
