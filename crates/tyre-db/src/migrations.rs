//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied in filename order when a [`Database`](crate::Database) opens.
//! Applied files must never be edited; schema changes go in a new
//! `NNN_description.sql`.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever the store has not seen yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (known, applied) = migration_status(pool).await.unwrap_or((MIGRATOR.migrations.len(), 0));
    debug!(known, applied, "Checking ledger schema");

    MIGRATOR.run(pool).await?;

    if applied < known {
        info!(applied = known - applied, "Ledger schema migrated");
    }
    Ok(())
}

/// `(known, applied)` migration counts. Fails before the first migration,
/// when the bookkeeping table does not exist yet.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
