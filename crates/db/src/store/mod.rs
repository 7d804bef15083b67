//! `PostgreSQL` implementation of the core repository traits.
//!
//! Every multi-row write runs in one transaction. Optimistic concurrency for
//! criteria rides on the counters in `data_revisions`.

mod audit;
mod budget;
mod criteria;
mod green;
mod ranking;
mod scores;

use keystone_core::StoreError;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait};

use crate::convert::store_error;
use crate::entities::data_revisions;

/// Repository backed by a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    /// Create a new store over an open connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Reads the revision row. Its absence means the schema was never migrated.
async fn read_revisions<C: ConnectionTrait>(conn: &C) -> Result<data_revisions::Model, StoreError> {
    data_revisions::Entity::find_by_id(data_revisions::SINGLETON_ID)
        .one(conn)
        .await
        .map_err(store_error)?
        .ok_or_else(|| StoreError::backend("data_revisions row missing"))
}
