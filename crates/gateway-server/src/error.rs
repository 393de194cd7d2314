//! API error types with JSON responses.
//!
//! Only transport-level failures become an [`ApiError`]. Service outcomes,
//! including errors, travel to the client inside a `RequestResult` with 200.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::delegates::UpstreamError;
use crate::services::DatabaseError;
use crate::services::agent_access::AgentAccessError;

/// API error that can be returned from handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Unauthorized (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    Internal(String),

    /// Database invariant violated (500).
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// An upstream service failed (502).
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Agent access management failed.
    #[error("{0}")]
    AgentAccess(#[from] AgentAccessError),
}

impl ApiError {
    /// Get the error code string for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Upstream(_) => "BAD_GATEWAY",
            Self::AgentAccess(e) => match e {
                AgentAccessError::InvalidAgent(_) => "BAD_REQUEST",
                AgentAccessError::NotFound(_) => "NOT_FOUND",
                AgentAccessError::AlreadyExists(_) => "CONFLICT",
                AgentAccessError::Keycloak(_) => "BAD_GATEWAY",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::AgentAccess(e) => match e {
                AgentAccessError::InvalidAgent(_) => StatusCode::BAD_REQUEST,
                AgentAccessError::NotFound(_) => StatusCode::NOT_FOUND,
                AgentAccessError::AlreadyExists(_) => StatusCode::CONFLICT,
                AgentAccessError::Keycloak(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorDetails,
}

/// Error details within the response.
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    /// Error code (e.g., "NOT_FOUND", "BAD_GATEWAY").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(DatabaseError::new("profile update failed")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(AgentAccessError::Keycloak(UpstreamError::Status(503))).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(AgentAccessError::InvalidAgent("no name".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(ApiError::Unauthorized("x".into()).code(), "UNAUTHORIZED");
        assert_eq!(
            ApiError::from(UpstreamError::Status(500)).code(),
            "BAD_GATEWAY"
        );
    }
}
