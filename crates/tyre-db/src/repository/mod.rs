//! # Repository Module
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StockLedger                                                           │
//! │       │  db.stock().apply_sale(id, 10, revenue)                        │
//! │       ▼                                                                 │
//! │  StockRepository                                                       │
//! │  ├── find_live / list / latest_closed_date_before                      │
//! │  ├── upsert_receipt      (single INSERT ... ON CONFLICT)               │
//! │  ├── apply_sale          (snapshot + guarded decrement, one tx)        │
//! │  ├── close_day                                                         │
//! │  └── open_carried_forward                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories execute decisions; they do not make them. Every conditional
//! write reports "matched nothing" as `None` or a zero count and leaves the
//! explanation to the caller.
//!
//! ## Available Repositories
//!
//! - [`StockRepository`](stock::StockRepository) - Live stock and snapshots
//! - [`SaleRepository`](sale::SaleRepository) - Sale ledger and summaries

pub mod sale;
pub mod stock;

/// Column list shared by `stock_records` and `stock_snapshots`.
pub(crate) const STOCK_COLUMNS: &str = "id, date, tyre_size, status, quantity, ssp_cents, \
     total_amount_cents, price_per_unit_cents, location, created_at, updated_at";

pub(crate) const SALE_COLUMNS: &str = "id, date, tyre_size, quantity, price_per_unit_cents, \
     total_amount_cents, customer_name, phone_number, comment, user_id, created_at";
