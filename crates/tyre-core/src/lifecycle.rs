//! # Stock Lifecycle
//!
//! The daily state machine of a stock record, as pure decisions. The
//! database layer executes these decisions as conditional SQL writes; the
//! functions here are what the engine consults before writing and what it
//! uses to explain a write that matched no rows. Quantities are only ever
//! judged against a record re-read after the write.
//!
//! ## State Machine
//! ```text
//!                 add_stock (new key)
//!                        │
//!                        ▼
//!   add_stock     ┌──────────────┐   first sale    ┌────────────────┐
//!   (replace) ──► │  open-stock  │ ──────────────► │ existing-stock │ ◄── add_stock
//!                 └──────┬───────┘                 └───────┬────────┘     (accumulate)
//!                        │ snapshot                        │ close_day
//!                        ▼                                 ▼
//!                 ┌──────────────┐                 ┌────────────────┐
//!                 │open-stock-day│                 │  closed-stock  │──► rollover to
//!                 └──────────────┘                 └────────────────┘    next open-stock
//!                   (immutable)                       (immutable)
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{StockRecord, StockStatus};

// =============================================================================
// Receipts
// =============================================================================

/// What a receipt does to the live record for its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptEffect {
    /// No live record: create one in `open-stock`.
    Create,
    /// `existing-stock`: add quantity and amount to the running totals.
    Accumulate,
    /// `open-stock`: overwrite quantity, prices, amount and location.
    Replace,
}

/// Decides how a receipt applies to the current live status.
///
/// ## Example
/// ```rust
/// use tyre_core::lifecycle::{receipt_effect, ReceiptEffect};
/// use tyre_core::types::StockStatus;
///
/// assert_eq!(receipt_effect(None).unwrap(), ReceiptEffect::Create);
/// assert_eq!(receipt_effect(Some(StockStatus::ExistingStock)).unwrap(), ReceiptEffect::Accumulate);
/// assert!(receipt_effect(Some(StockStatus::ClosedStock)).is_err());
/// ```
pub fn receipt_effect(current: Option<StockStatus>) -> Result<ReceiptEffect, StockStatus> {
    match current {
        None => Ok(ReceiptEffect::Create),
        Some(StockStatus::OpenStock) => Ok(ReceiptEffect::Replace),
        Some(StockStatus::ExistingStock) => Ok(ReceiptEffect::Accumulate),
        Some(other) => Err(other),
    }
}

// =============================================================================
// Sales
// =============================================================================

/// Pre-write plan for a sale against one live record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalePlan {
    /// The record was still `open-stock` when read: expect a snapshot.
    pub snapshot_first: bool,
    /// Running total after the sale, as of the record that was read.
    pub total_amount: Money,
}

/// Checks a sale worth `revenue` against `stock`.
///
/// Only the status and the running total are judged here. Whether enough
/// units are on hand is left to the guarded decrement, which sees the
/// store's current quantity rather than this possibly stale copy.
pub fn plan_sale(stock: &StockRecord, revenue: Money) -> CoreResult<SalePlan> {
    match stock.status {
        StockStatus::OpenStock | StockStatus::ExistingStock => {}
        StockStatus::ClosedStock => {
            return Err(CoreError::DayClosed {
                date: stock.date,
                tyre_size: stock.tyre_size.clone(),
            })
        }
        StockStatus::OpenStockDay => {
            return Err(CoreError::StockNotFound {
                date: stock.date,
                tyre_size: stock.tyre_size.clone(),
            })
        }
    }

    let total_amount = stock
        .total_amount()
        .checked_add(revenue)
        .ok_or_else(amount_overflow)?;

    Ok(SalePlan {
        snapshot_first: stock.status == StockStatus::OpenStock,
        total_amount,
    })
}

/// Explains why a guarded decrement matched no rows, given the record as
/// re-read after the failed write (`None` when it no longer exists).
///
/// A live record that could cover the sale was refused on its running
/// total instead.
pub fn diagnose_failed_sale(
    date: NaiveDate,
    tyre_size: &str,
    current: Option<&StockRecord>,
    quantity: i64,
) -> CoreError {
    match current {
        None => CoreError::StockNotFound {
            date,
            tyre_size: tyre_size.to_string(),
        },
        Some(stock) if stock.status == StockStatus::ClosedStock => CoreError::DayClosed {
            date,
            tyre_size: tyre_size.to_string(),
        },
        Some(stock) if stock.can_sell(quantity) => amount_overflow(),
        Some(stock) => CoreError::InsufficientStock {
            tyre_size: tyre_size.to_string(),
            available: stock.quantity,
            requested: quantity,
        },
    }
}

/// Explains why a receipt upsert wrote nothing. Closed keys refuse every
/// receipt; a live key refused one whose totals would leave the integer
/// range.
pub fn diagnose_failed_receipt(date: NaiveDate, tyre_size: &str, current: Option<&StockRecord>) -> CoreError {
    match current {
        Some(stock) if stock.status.is_mutable() => amount_overflow(),
        _ => CoreError::DayClosed {
            date,
            tyre_size: tyre_size.to_string(),
        },
    }
}

fn amount_overflow() -> CoreError {
    CoreError::AmountOverflow {
        field: "total_amount".to_string(),
    }
}

// =============================================================================
// Rollover
// =============================================================================

/// Whether a closing balance is carried into the next day.
pub fn carries_forward(closed: &StockRecord) -> bool {
    closed.status == StockStatus::ClosedStock && closed.quantity > 0
}

/// Opening amount for carried-forward stock: `quantity × price_per_unit`.
pub fn rollover_amount(closed: &StockRecord) -> CoreResult<Money> {
    closed
        .price_per_unit()
        .checked_multiply_quantity(closed.quantity)
        .ok_or_else(amount_overflow)
}

// =============================================================================
// Unit Tests
// =============================================================================
