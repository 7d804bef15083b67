use keystone_core::environmental::{GreenUpgrade, GreenUpgradeSource};
use keystone_core::StoreError;
use keystone_shared::types::ProjectId;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use super::PgStore;
use crate::convert::{green_upgrade_from_model, store_error};
use crate::entities::green_upgrades;

impl GreenUpgradeSource for PgStore {
    async fn list_green_upgrades(&self, project_id: ProjectId) -> Result<Vec<GreenUpgrade>, StoreError> {
        green_upgrades::Entity::find()
            .filter(green_upgrades::Column::ProjectId.eq(project_id.into_inner()))
            .order_by_asc(green_upgrades::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(green_upgrade_from_model)
            .collect()
    }
}
