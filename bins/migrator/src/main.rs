//! Database migration runner for Keystone.
//!
//! Reads `DATABASE_URL` (or `.env`).
//!
//! Usage:
//!   migrator up      - Apply the prioritization and budget schema
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use keystone_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The migrator CLI installs its own tracing subscriber
    cli::run_cli(Migrator).await;
}
