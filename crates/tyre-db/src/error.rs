//! # Storage Errors
//!
//! ```text
//! sqlx::Error ──► DbError ──► LedgerError::Persistence ──► ApiError { PERSISTENCE_ERROR }
//! ```
//!
//! Business rejections (short stock, closed day) never surface here: the
//! repositories report a guard that matched nothing as `None` or a zero
//! count. A `DbError` means the store itself refused or failed.

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// A second live record or snapshot for the same `(date, tyre_size)`.
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// A CHECK constraint failed, e.g. `quantity >= 0`, or a stock amount
    /// left the integer range.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// An immutability trigger rejected an UPDATE of a snapshot, a closed
    /// record or a sale record.
    #[error("Record is immutable: {0}")]
    Immutable(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::Duplicate(message),
                    ErrorKind::CheckViolation => DbError::ConstraintViolation(message),
                    _ if message.ends_with("immutable") => DbError::Immutable(message),
                    _ if message.ends_with("must be integers") => DbError::ConstraintViolation(message),
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::RowNotFound => DbError::not_found("Row", "query returned no rows"),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
