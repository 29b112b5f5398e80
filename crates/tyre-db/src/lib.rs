//! # tyre-db: Database Layer for the Tyre Stock Ledger
//!
//! SQLite storage for stock records, open-stock-day snapshots and sale
//! records, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tyre Ledger Data Flow                            │
//! │                                                                         │
//! │  StockLedger / SaleProcessor (tyre-ledger)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tyre-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ StockRepo     │    │ 001_initial_ │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │ schema.sql   │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite: stock_records, stock_snapshots, sale_records          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Stock and sale repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tyre_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tyres.db")).await?;
//! let open = db.stock().list(StockStatus::OpenStock, Some(date)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::sale::SaleRepository;
pub use repository::stock::StockRepository;
