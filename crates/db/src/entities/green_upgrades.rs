//! `SeaORM` Entity for green_upgrades table (read-only).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "green_upgrades")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub energy_savings_kwh: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub water_savings_gallons: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))")]
    pub ghg_reduction_tonnes: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
