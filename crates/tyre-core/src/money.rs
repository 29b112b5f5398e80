//! # Money
//!
//! Stock valuations and sale totals are integers in the currency's minor
//! unit. A day's sale totals then add up exactly to the amount the stock
//! record gained, which floating point cannot promise.
//!
//! ```text
//! RecordSaleRequest.price_per_unit × quantity ──► SaleEntry.total_amount
//!                                                   ├──► SaleRecord.total_amount_cents
//!                                                   └──► StockRecord.total_amount_cents += total
//!
//! closed price_per_unit × closed quantity ──► rolled-over StockRecord.total_amount_cents
//! ```
//!
//! Arithmetic that can be driven by caller input is checked and reports
//! overflow as `None`; the callers turn that into `AmountOverflow`.
//!
//! ```rust
//! use tyre_core::money::Money;
//!
//! let unit = Money::from_cents(1_000);
//! let line = unit.checked_multiply_quantity(10).unwrap();
//! assert_eq!(line.cents(), 10_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount in minor units (cents, paisa, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Unit price times quantity; `None` on overflow.
    ///
    /// ```rust
    /// use tyre_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1_200);
    /// assert_eq!(unit_price.checked_multiply_quantity(10), Some(Money::from_cents(12_000)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }
}

/// `major.minor` with two decimals, no currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
