//! # Ledger Error Types
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Tyre Ledger                        │
//! │                                                                         │
//! │  StockLedger / SaleProcessor                                           │
//! │       │                                                                 │
//! │       ├── CoreError (rule rejected)  ─┐                                │
//! │       │                               ├──► LedgerError ──► ApiError    │
//! │       └── DbError (storage failed)  ──┘        │              │        │
//! │                                              code()      { code,       │
//! │                                                            message }   │
//! │                                                                         │
//! │  The HTTP layer (outside this workspace) maps ErrorCode to a status.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use tyre_core::CoreError;
use tyre_db::DbError;

/// Any failure surfaced by the engine.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] DbError),
}

impl LedgerError {
    /// Machine-readable category of the failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Core(err) => match err {
                CoreError::Forbidden { .. } => ErrorCode::Forbidden,
                CoreError::StockNotFound { .. } => ErrorCode::StockNotFound,
                CoreError::NotFound { .. } => ErrorCode::NotFound,
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::NoStockAvailable { .. } => ErrorCode::NoStockAvailable,
                CoreError::DayClosed { .. }
                | CoreError::AmountOverflow { .. }
                | CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            LedgerError::Persistence(_) => ErrorCode::PersistenceError,
        }
    }

    /// Borrow the domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            LedgerError::Core(err) => Some(err),
            LedgerError::Persistence(_) => None,
        }
    }
}

/// Result type for engine operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// API Error
// =============================================================================

/// Serializable error for the HTTP layer.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for 185/65R15: available 40, requested 60"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Role may not perform the action (403)
    Forbidden,

    /// Input validation failed or the day is closed (400)
    ValidationError,

    /// No live stock for the requested key (404)
    StockNotFound,

    /// Nothing to act on for the date (404)
    NotFound,

    /// Sale exceeds available quantity (409)
    InsufficientStock,

    /// Rollover found nothing to open (404)
    NoStockAvailable,

    /// Storage failed (500)
    PersistenceError,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }
}

/// Domain messages pass through; storage details are logged and replaced.
impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let code = err.code();
        match err {
            LedgerError::Core(core) => ApiError::new(code, core.to_string()),
            LedgerError::Persistence(db) => {
                tracing::error!("Persistence failure: {}", db);
                ApiError::new(code, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        LedgerError::from(err).into()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
