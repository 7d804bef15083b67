//! `SeaORM` Entity for budget_cycles table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_cycles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub start_year: i32,
    pub duration_years: i32,
    pub end_year: i32,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_budget: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub inflation_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub escalation_rate: Decimal,
    #[sea_orm(column_type = "JsonBinary")]
    pub funding_constraints: Json,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budget_allocations::Entity")]
    BudgetAllocations,
}

impl Related<super::budget_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
