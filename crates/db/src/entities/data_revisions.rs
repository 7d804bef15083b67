//! `SeaORM` Entity for data_revisions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Primary key of the only row.
pub const SINGLETON_ID: i16 = 1;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "data_revisions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i16,
    pub criteria_revision: i64,
    pub score_revision: i64,
    pub ranking_criteria_revision: Option<i64>,
    pub ranking_score_revision: Option<i64>,
    pub ranking_calculated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
