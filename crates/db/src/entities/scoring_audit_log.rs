//! `SeaORM` Entity for scoring_audit_log table (append-only).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "scoring_audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub criteria_id: Uuid,
    pub action: String,
    pub old_score: Option<Decimal>,
    pub new_score: Option<Decimal>,
    #[sea_orm(column_type = "Text", nullable)]
    pub old_justification: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub new_justification: Option<String>,
    pub old_status: Option<String>,
    pub new_status: Option<String>,
    pub changed_by: Uuid,
    pub changed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
