//! # Ledger Database Handle
//!
//! Opens the SQLite store behind the ledger and hands out repositories.
//!
//! ```text
//! LedgerConfig::db_config()          DbConfig::in_memory()
//!          │                                  │
//!          └──────────────┬───────────────────┘
//!                         ▼
//!            Database::open(config) ── migrate ──► 001_initial_schema.sql
//!                         │
//!            ┌────────────┴────────────┐
//!            ▼                         ▼
//!       db.stock()                db.sales()
//!    StockRepository           SaleRepository
//! ```
//!
//! ## Concurrent sales
//! SQLite allows one writer at a time. Two sales of the same tyre size from
//! different connections queue on the write lock for up to `busy_timeout`;
//! the second one then sees the first one's decrement in its `quantity >= ?`
//! guard. File databases use WAL so stock queries never wait on a sale.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::sale::SaleRepository;
use crate::repository::stock::StockRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// DbConfig
// =============================================================================

/// Where the ledger lives and how the pool behaves.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tyre_db::DbConfig;
///
/// let config = DbConfig::new("/var/lib/tyres/ledger.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// assert_eq!(config.max_connections, 8);
/// assert!(!config.is_in_memory());
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, or `:memory:`.
    pub database_path: PathBuf,

    pub max_connections: u32,

    /// How long a caller waits for a free connection.
    pub acquire_timeout: Duration,

    /// How long a writer waits on SQLite's write lock before failing.
    pub busy_timeout: Duration,

    /// Apply embedded migrations when the pool opens.
    pub migrate: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(5),
            migrate: true,
        }
    }

    /// A private database for one test.
    ///
    /// Every connection to `:memory:` opens a separate database, so the pool
    /// is pinned to a single connection that never idles out. Transactions
    /// therefore run one after another.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Skip migrations, for stores migrated out of band.
    pub fn without_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .foreign_keys(true))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout);

        if self.is_in_memory() {
            options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the ledger store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the store and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        if let Some(dir) = config.database_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            ensure_dir(dir)?;
        }

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Ledger database opened"
        );

        let db = Database { pool };

        if config.migrate {
            db.run_migrations().await?;
        } else {
            debug!("Skipping migrations");
        }

        Ok(db)
    }

    /// Applies pending migrations; a no-op when the schema is current.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Live stock and open-stock-day snapshots.
    pub fn stock(&self) -> StockRepository {
        StockRepository::new(self.pool.clone())
    }

    /// The sale ledger.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Waits for in-flight queries, then closes every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Ledger database closed");
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "Database health check failed");
                false
            }
        }
    }
}

fn ensure_dir(dir: &Path) -> DbResult<()> {
    if dir.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)
        .map_err(|e| DbError::ConnectionFailed(format!("cannot create {}: {e}", dir.display())))
}
