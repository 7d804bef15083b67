//! `SeaORM` Entity for budget_allocations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cycle_id: Uuid,
    pub project_id: Uuid,
    pub year: i32,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub allocated_amount: Decimal,
    pub priority: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub justification: Option<String>,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budget_cycles::Entity",
        from = "Column::CycleId",
        to = "super::budget_cycles::Column::Id",
        on_delete = "Cascade"
    )]
    BudgetCycles,
}

impl Related<super::budget_cycles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetCycles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
