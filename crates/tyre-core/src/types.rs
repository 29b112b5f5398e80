//! # Domain Types
//!
//! Core domain types used throughout the tyre stock ledger.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────────┐                     │
//! │  │    StockRecord      │   │     SaleRecord      │                     │
//! │  │  ─────────────────  │   │  ─────────────────  │                     │
//! │  │  (date, tyre_size)  │◄──│  (date, tyre_size)  │ resolved at write   │
//! │  │  status             │   │  quantity           │                     │
//! │  │  quantity           │   │  total_amount_cents │                     │
//! │  │  total_amount_cents │   │  user_id            │                     │
//! │  └─────────────────────┘   └─────────────────────┘                     │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────────┐                     │
//! │  │    StockStatus      │   │   Requests          │                     │
//! │  │  open-stock         │   │  AddStockRequest    │──► StockReceipt     │
//! │  │  existing-stock     │   │  RecordSaleRequest  │──► SaleEntry        │
//! │  │  open-stock-day     │   └─────────────────────┘  (validated forms)  │
//! │  │  closed-stock       │                                               │
//! │  └─────────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every record has a UUID `id`. The business key of stock is
//! `(date, tyre_size)`: one live record per key plus at most one
//! `open-stock-day` snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Stock Status
// =============================================================================

/// Daily lifecycle status of a stock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    /// Received for the date, nothing sold yet.
    OpenStock,
    /// At least one sale applied; live and mutable.
    ExistingStock,
    /// Immutable copy of the open stock taken at the first sale.
    OpenStockDay,
    /// Immutable end-of-day balance.
    ClosedStock,
}

impl StockStatus {
    pub const ALL: [StockStatus; 4] = [
        StockStatus::OpenStock,
        StockStatus::ExistingStock,
        StockStatus::OpenStockDay,
        StockStatus::ClosedStock,
    ];

    /// Wire and storage name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OpenStock => "open-stock",
            StockStatus::ExistingStock => "existing-stock",
            StockStatus::OpenStockDay => "open-stock-day",
            StockStatus::ClosedStock => "closed-stock",
        }
    }

    /// Records in these states accept receipts and sales.
    pub const fn is_mutable(&self) -> bool {
        matches!(self, StockStatus::OpenStock | StockStatus::ExistingStock)
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StockStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: StockStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Stock Record
// =============================================================================

/// Inventory of one tyre size on one business date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub id: String,
    pub date: NaiveDate,
    pub tyre_size: String,
    pub status: StockStatus,
    pub quantity: i64,
    /// Suggested selling price per unit.
    pub ssp_cents: i64,
    /// Cumulative recorded amount: receipts plus recognised sale revenue.
    pub total_amount_cents: i64,
    pub price_per_unit_cents: i64,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockRecord {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn price_per_unit(&self) -> Money {
        Money::from_cents(self.price_per_unit_cents)
    }

    #[inline]
    pub fn ssp(&self) -> Money {
        Money::from_cents(self.ssp_cents)
    }

    /// True when `quantity` units can be sold from this record right now.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.status.is_mutable() && self.quantity >= quantity
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// An accepted sale. Immutable once written; corrections are new records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    pub date: NaiveDate,
    pub tyre_size: String,
    pub quantity: i64,
    pub price_per_unit_cents: i64,
    /// `quantity × price_per_unit`.
    pub total_amount_cents: i64,
    pub customer_name: String,
    pub phone_number: Option<String>,
    pub comment: Option<String>,
    /// Account that recorded the sale (non-owning reference).
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl SaleRecord {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// Aggregated sales for one business date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub date: NaiveDate,
    pub sale_count: i64,
    pub quantity: i64,
    pub total_amount_cents: i64,
}

// =============================================================================
// Requests
// =============================================================================

/// Stock receipt as submitted by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStockRequest {
    pub date: NaiveDate,
    pub tyre_size: String,
    pub quantity: i64,
    #[serde(rename = "SSP", alias = "sspCents")]
    pub ssp_cents: i64,
    pub total_amount_cents: i64,
    pub price_per_unit_cents: i64,
    pub location: String,
}

/// A receipt that passed validation, with the tyre size normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReceipt {
    pub date: NaiveDate,
    pub tyre_size: String,
    pub quantity: i64,
    pub ssp: Money,
    pub total_amount: Money,
    pub price_per_unit: Money,
    pub location: String,
}

/// Sale as submitted by the caller. `date` defaults to today when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSaleRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub tyre_size: String,
    pub quantity: i64,
    pub customer_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    pub price_per_unit_cents: i64,
}

/// A validated sale with its effective date and computed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleEntry {
    pub date: NaiveDate,
    pub tyre_size: String,
    pub quantity: i64,
    pub price_per_unit: Money,
    pub total_amount: Money,
    pub customer_name: String,
    pub phone_number: Option<String>,
    pub comment: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
