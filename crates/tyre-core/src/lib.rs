//! # tyre-core: Pure Business Logic for the Tyre Stock Ledger
//!
//! This crate holds the rules of the stock lifecycle as pure functions with
//! zero I/O dependencies. The database layer (`tyre-db`) and the engine
//! (`tyre-ledger`) build on it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Tyre Ledger Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP layer / auth (outside this workspace)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Actor { id, role } + request           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          tyre-ledger: StockLedger, SaleProcessor                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tyre-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ lifecycle │  │   auth    │  │ validation│  │   │
//! │  │   │StockRecord│  │ receipt / │  │  Actor    │  │  tyre     │  │   │
//! │  │   │SaleRecord │  │ sale rules│  │  Policy   │  │  sizes    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tyre-db (Database Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockRecord, SaleRecord, requests)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`lifecycle`] - Stock status transitions for receipts, sales and rollover
//! - [`auth`] - Actor, roles and the injectable access policy
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tyre_core::money::Money;
//!
//! let price = Money::from_cents(120_000);
//! let total = price.checked_multiply_quantity(10).unwrap();
//! assert_eq!(total.cents(), 1_200_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::{AccessPolicy, Action, Actor, Role, RolePolicy};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted by a single receipt or sale.
///
/// ## Business Reason
/// Guards against typing 10000 instead of 100 at the counter.
pub const MAX_QUANTITY: i64 = 10_000;

/// Largest amount, in minor units, accepted for any single price or total.
///
/// Far below `i64::MAX`, so running totals built from many receipts and
/// sales stay integers.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000_000;

/// Maximum length of a tyre size key (e.g. `"185/65R15 88H"`).
pub const MAX_TYRE_SIZE_LEN: usize = 32;
