//! Status-carrying results returned by every delegate call.

use serde::{Deserialize, Serialize};

/// Outcome of a database operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbStatusCode {
    Error,
    Created,
    Read,
    Updated,
    Deleted,
    /// Changes staged but not yet committed.
    Deferred,
    NotFound,
    /// Row changed since it was read (version mismatch).
    Concurrency,
}

/// Payload plus the status of the operation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbResult<T> {
    pub payload: Option<T>,
    pub status: DbStatusCode,
    #[serde(default)]
    pub message: String,
}

impl<T> DbResult<T> {
    /// Result with a payload.
    pub fn new(status: DbStatusCode, payload: T) -> Self {
        Self {
            payload: Some(payload),
            status,
            message: String::new(),
        }
    }

    /// Result with only a status and message.
    pub fn status(status: DbStatusCode, message: impl Into<String>) -> Self {
        Self {
            payload: None,
            status,
            message: message.into(),
        }
    }

    /// Failed result.
    pub fn error(message: impl Into<String>) -> Self {
        Self::status(DbStatusCode::Error, message)
    }

    /// Whether the status is `status`.
    pub fn is(&self, status: DbStatusCode) -> bool {
        self.status == status
    }
}

impl<T> From<sqlx::Error> for DbResult<T> {
    fn from(error: sqlx::Error) -> Self {
        tracing::error!(error = %error, "Database operation failed");
        Self::error(error.to_string())
    }
}
