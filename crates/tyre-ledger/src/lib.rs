//! # tyre-ledger: Stock Lifecycle and Sales Engine
//!
//! Tracks tyre inventory per `(date, tyre size)` through its daily lifecycle
//! and reconciles sales against it.
//!
//! ## Stock Lifecycle
//! ```text
//!            receipt                 first sale                close_day
//!   (none) ─────────► open-stock ───────────────► existing-stock ─────────► closed-stock
//!                         │    snapshot taken ──► open-stock-day               │
//!                         │                                                    │
//!                         ◄──────────── rollover_open_stock(next day) ─────────┘
//! ```
//!
//! ## Modules
//! - [`ledger`]: [`StockLedger`], receipts, sale deltas, close and rollover
//! - [`sales`]: [`SaleProcessor`], validated sales with immutable records
//! - [`notify`]: best-effort stock events
//! - [`config`]: TOML plus environment configuration
//! - [`error`]: [`LedgerError`] and the serializable [`ApiError`]
//!
//! ## Example
//! ```rust,ignore
//! let db = Database::new(config.db_config()).await?;
//! let ledger = StockLedger::from_config(db, &config, Arc::new(TracingNotifier));
//! let sales = SaleProcessor::new(ledger.clone());
//!
//! ledger.add_stock(&owner, receipt).await?;
//! sales.record_sale(&worker, sale).await?;
//! ledger.close_day(today).await?;
//! ledger.rollover_open_stock(tomorrow).await?;
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod sales;

pub use config::{ConfigError, LedgerConfig};
pub use error::{ApiError, ErrorCode, LedgerError, LedgerResult};
pub use ledger::StockLedger;
pub use notify::{
    ChannelNotifier, NotificationDispatcher, Notifier, NotifyError, StockEvent, TracingNotifier,
};
pub use sales::SaleProcessor;
