use keystone_core::budget::{BudgetAllocation, BudgetCycle, BudgetRepository, BudgetWrite};
use keystone_core::StoreError;
use std::collections::BTreeSet;

use keystone_shared::types::{AllocationId, BudgetCycleId};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use tracing::warn;

use super::PgStore;
use crate::convert::{
    allocation_from_model, allocation_to_active, cycle_from_model, cycle_to_active, store_error,
};
use crate::entities::{budget_allocations, budget_cycles};

impl BudgetRepository for PgStore {
    async fn list_cycles(&self) -> Result<Vec<BudgetCycle>, StoreError> {
        budget_cycles::Entity::find()
            .order_by_desc(budget_cycles::Column::StartYear)
            .order_by_asc(budget_cycles::Column::Name)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(cycle_from_model)
            .collect()
    }

    async fn get_cycle(&self, id: BudgetCycleId) -> Result<Option<BudgetCycle>, StoreError> {
        budget_cycles::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?
            .map(cycle_from_model)
            .transpose()
    }

    async fn list_allocations(&self, cycle_id: BudgetCycleId) -> Result<Vec<BudgetAllocation>, StoreError> {
        budget_allocations::Entity::find()
            .filter(budget_allocations::Column::CycleId.eq(cycle_id.into_inner()))
            .order_by_asc(budget_allocations::Column::Year)
            .order_by_asc(budget_allocations::Column::Priority)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(allocation_from_model)
            .collect()
    }

    async fn get_allocation(&self, id: AllocationId) -> Result<Option<BudgetAllocation>, StoreError> {
        budget_allocations::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?
            .map(allocation_from_model)
            .transpose()
    }

    async fn apply_budget_writes(&self, writes: Vec<BudgetWrite>) -> Result<(), StoreError> {
        if writes.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await.map_err(store_error)?;
        let guarded: BTreeSet<_> = writes
            .iter()
            .filter_map(|write| match write {
                BudgetWrite::EnsureWithinFunding { cycle_id, .. } => Some(cycle_id.into_inner()),
                _ => None,
            })
            .collect();
        if !guarded.is_empty() {
            // SELECT ... FOR UPDATE serializes guarded batches on the same cycle.
            budget_cycles::Entity::find()
                .filter(budget_cycles::Column::Id.is_in(guarded))
                .lock_exclusive()
                .all(&txn)
                .await
                .map_err(store_error)?;
        }
        for write in &writes {
            apply_write(&txn, write).await?;
        }
        txn.commit().await.map_err(store_error)?;
        Ok(())
    }
}

async fn apply_write(txn: &DatabaseTransaction, write: &BudgetWrite) -> Result<(), StoreError> {
    match write {
        BudgetWrite::SaveCycle(cycle) => {
            budget_cycles::Entity::insert(cycle_to_active(cycle)?)
                .on_conflict(
                    OnConflict::column(budget_cycles::Column::Id)
                        .update_columns([
                            budget_cycles::Column::Name,
                            budget_cycles::Column::Description,
                            budget_cycles::Column::StartYear,
                            budget_cycles::Column::DurationYears,
                            budget_cycles::Column::EndYear,
                            budget_cycles::Column::TotalBudget,
                            budget_cycles::Column::InflationRate,
                            budget_cycles::Column::EscalationRate,
                            budget_cycles::Column::FundingConstraints,
                            budget_cycles::Column::Status,
                            budget_cycles::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec(txn)
                .await
                .map_err(store_error)?;
        }
        BudgetWrite::DeleteCycle(id) => {
            budget_allocations::Entity::delete_many()
                .filter(budget_allocations::Column::CycleId.eq(id.into_inner()))
                .exec(txn)
                .await
                .map_err(store_error)?;
            budget_cycles::Entity::delete_by_id(id.into_inner())
                .exec(txn)
                .await
                .map_err(store_error)?;
        }
        BudgetWrite::SaveAllocation(allocation) => {
            budget_allocations::Entity::insert(allocation_to_active(allocation))
                .on_conflict(
                    OnConflict::column(budget_allocations::Column::Id)
                        .update_columns([
                            budget_allocations::Column::Year,
                            budget_allocations::Column::AllocatedAmount,
                            budget_allocations::Column::Priority,
                            budget_allocations::Column::Justification,
                            budget_allocations::Column::Status,
                            budget_allocations::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec(txn)
                .await
                .map_err(store_error)?;
        }
        BudgetWrite::DeleteAllocation(id) => {
            budget_allocations::Entity::delete_by_id(id.into_inner())
                .exec(txn)
                .await
                .map_err(store_error)?;
        }
        BudgetWrite::EnsureWithinFunding { cycle_id, year } => {
            ensure_within_funding(txn, *cycle_id, *year).await?;
        }
    }
    Ok(())
}

async fn ensure_within_funding(
    txn: &DatabaseTransaction,
    cycle_id: BudgetCycleId,
    year: i32,
) -> Result<(), StoreError> {
    let Some(model) = budget_cycles::Entity::find_by_id(cycle_id.into_inner())
        .one(txn)
        .await
        .map_err(store_error)?
    else {
        return Ok(());
    };
    let Some(cap) = cycle_from_model(model)?.constraint_for(year) else {
        return Ok(());
    };

    let amounts: Vec<Decimal> = budget_allocations::Entity::find()
        .select_only()
        .column(budget_allocations::Column::AllocatedAmount)
        .filter(budget_allocations::Column::CycleId.eq(cycle_id.into_inner()))
        .filter(budget_allocations::Column::Year.eq(year))
        .into_tuple()
        .all(txn)
        .await
        .map_err(store_error)?;
    let total = amounts.into_iter().try_fold(Decimal::ZERO, Decimal::checked_add);
    if total.is_none_or(|total| total > cap) {
        warn!(cycle_id = %cycle_id, year, cap = %cap, "Funding constraint guard failed");
        return Err(StoreError::Conflict);
    }
    Ok(())
}
