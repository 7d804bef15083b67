//! `SeaORM` Entity for project_scores table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "project_scores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub criteria_id: Uuid,
    pub score: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub justification: Option<String>,
    pub status: String,
    pub scored_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::criteria::Entity",
        from = "Column::CriteriaId",
        to = "super::criteria::Column::Id",
        on_delete = "Cascade"
    )]
    Criteria,
}

impl Related<super::criteria::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Criteria.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
