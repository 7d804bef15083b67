use keystone_core::ranking::{RankingEntry, RankingMetadata, RankingRepository, RankingSnapshot};
use keystone_core::{DataRevision, StoreError};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::debug;

use super::{read_revisions, PgStore};
use crate::convert::{ranking_from_model, ranking_to_active, store_error, to_db, to_utc};
use crate::entities::{data_revisions, ranking_cache};

impl RankingRepository for PgStore {
    async fn data_revision(&self) -> Result<DataRevision, StoreError> {
        let revisions = read_revisions(&self.db).await?;
        Ok(DataRevision::new(revisions.criteria_revision, revisions.score_revision))
    }

    async fn replace_ranking(&self, snapshot: RankingSnapshot) -> Result<(), StoreError> {
        let rows = snapshot
            .entries
            .iter()
            .map(ranking_to_active)
            .collect::<Result<Vec<_>, _>>()?;

        let txn = self.db.begin().await.map_err(store_error)?;

        ranking_cache::Entity::delete_many()
            .exec(&txn)
            .await
            .map_err(store_error)?;

        if !rows.is_empty() {
            ranking_cache::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(store_error)?;
        }

        data_revisions::Entity::update_many()
            .col_expr(
                data_revisions::Column::RankingCriteriaRevision,
                Expr::value(snapshot.revision.criteria),
            )
            .col_expr(
                data_revisions::Column::RankingScoreRevision,
                Expr::value(snapshot.revision.scores),
            )
            .col_expr(
                data_revisions::Column::RankingCalculatedAt,
                Expr::value(to_db(snapshot.calculated_at)),
            )
            .filter(data_revisions::Column::Id.eq(data_revisions::SINGLETON_ID))
            .exec(&txn)
            .await
            .map_err(store_error)?;

        txn.commit().await.map_err(store_error)?;
        debug!(entries = snapshot.entries.len(), "Ranking cache replaced");
        Ok(())
    }

    async fn ranking_metadata(&self) -> Result<RankingMetadata, StoreError> {
        let revisions = read_revisions(&self.db).await?;
        let entry_count = ranking_cache::Entity::find()
            .count(&self.db)
            .await
            .map_err(store_error)?;

        let revision = match (revisions.ranking_criteria_revision, revisions.ranking_score_revision) {
            (Some(criteria), Some(scores)) => Some(DataRevision::new(criteria, scores)),
            _ => None,
        };

        Ok(RankingMetadata {
            calculated_at: revisions.ranking_calculated_at.map(to_utc),
            revision,
            entry_count: usize::try_from(entry_count).unwrap_or(usize::MAX),
        })
    }

    async fn ranked_entries(&self) -> Result<Vec<RankingEntry>, StoreError> {
        ranking_cache::Entity::find()
            .order_by_asc(ranking_cache::Column::Rank)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(ranking_from_model)
            .collect()
    }
}
