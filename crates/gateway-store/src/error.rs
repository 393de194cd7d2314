//! Error types for the storage layer.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur outside of delegate calls.
///
/// Delegate methods report failures through [`crate::DbResult`] instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection error.
    #[error("database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    MigrationError(String),

    /// Stored value could not be mapped to a domain type.
    #[error("invalid stored value: {0}")]
    InvalidValue(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
