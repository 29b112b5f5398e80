//! # Domain Errors
//!
//! Rejections decided by the ledger's rules. Storage failures live in
//! `tyre-db::DbError`; `tyre-ledger` joins both into `LedgerError`.
//!
//! ```text
//! ValidationError ──► CoreError ──► LedgerError ──► ApiError { code, message }
//! ```

use chrono::NaiveDate;
use thiserror::Error;

/// Why the ledger refused an operation. Never retried internally.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Forbidden: role '{role}' may not {action}")]
    Forbidden { role: String, action: String },

    /// No live record for the `(date, tyre_size)` key.
    #[error("Stock not found for {tyre_size} on {date}")]
    StockNotFound { date: NaiveDate, tyre_size: String },

    /// Nothing to act on, e.g. no stock to close for a date.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// The sale would take quantity below zero. The guarded decrement is
    /// rolled back, so nothing is written:
    ///
    /// ```text
    /// on hand 40, sell 60 ──► InsufficientStock { available: 40, requested: 60 }
    ///                         stock unchanged, no sale record
    /// ```
    #[error("Insufficient stock for {tyre_size}: available {available}, requested {requested}")]
    InsufficientStock {
        tyre_size: String,
        available: i64,
        requested: i64,
    },

    /// Rollover left the date without any open stock.
    #[error("No stock available to open on {date}")]
    NoStockAvailable { date: NaiveDate },

    /// The key is closed-stock for the date and accepts nothing further.
    #[error("Stock for {tyre_size} on {date} is closed")]
    DayClosed { date: NaiveDate, tyre_size: String },

    #[error("Amount overflow computing {field}")]
    AmountOverflow { field: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// Rejections the caller should present as bad input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::DayClosed { .. } | CoreError::AmountOverflow { .. }
        )
    }
}

/// A request field failed its check. Raised before any lookup or write.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Malformed tyre size or phone number.
    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of {}", .allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

pub type CoreResult<T> = Result<T, CoreError>;
