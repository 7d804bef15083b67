//! `SeaORM` Entity for criteria table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "criteria")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub category: String,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub weight: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub scoring_guideline: Option<String>,
    pub lifecycle: String,
    pub display_order: i32,
    pub model_version_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::model_versions::Entity",
        from = "Column::ModelVersionId",
        to = "super::model_versions::Column::Id"
    )]
    ModelVersions,
    #[sea_orm(has_many = "super::project_scores::Entity")]
    ProjectScores,
}

impl Related<super::model_versions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ModelVersions.def()
    }
}

impl Related<super::project_scores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectScores.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
