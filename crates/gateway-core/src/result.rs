//! Uniform result envelope returned by every service.
//!
//! Services never surface delegate failures as Rust errors. They translate
//! them into a [`RequestResult`] whose `result_status` is `Error` or
//! `ActionRequired` and whose `result_error` carries a stable error code.
//!
//! Error codes are built by [`ErrorTranslator`] from an [`ErrorType`] and a
//! [`ServiceType`], e.g. `HG-CE-BCMP` for a BC Mail Plus communication failure.

use serde::{Deserialize, Serialize};

// ============================================================================
// Status and Error Classification
// ============================================================================

/// Outcome of a service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultType {
    /// The call failed.
    Error,
    /// The call succeeded.
    Success,
    /// The caller must act (retry, re-validate, ...) before the data is available.
    ActionRequired,
}

/// Action the caller is expected to take when the status is `ActionRequired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    /// Retry the request later.
    Refresh,
    /// Data is protected and needs an additional step to view.
    Protected,
    /// Input must be re-validated.
    Validation,
    /// Input is invalid.
    Invalid,
}

impl ActionType {
    /// Short code embedded in action-required error codes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Refresh => "REFRESH",
            Self::Protected => "PROTECTED",
            Self::Validation => "VALIDATION",
            Self::Invalid => "INVALID",
        }
    }
}

/// Category of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    CommunicationInternal,
    CommunicationExternal,
    InvalidState,
    SmsInvalid,
    EmailInvalid,
    MaxRetries,
}

impl ErrorType {
    /// Short code embedded in error codes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CommunicationInternal => "CI",
            Self::CommunicationExternal => "CE",
            Self::InvalidState => "IS",
            Self::SmsInvalid => "SI",
            Self::EmailInvalid => "EI",
            Self::MaxRetries => "MR",
        }
    }
}

/// Collaborator an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Database,
    Phsa,
    Bcmp,
    Keycloak,
    Cdogs,
    Laboratory,
    Immunization,
    Patient,
}

impl ServiceType {
    /// Short code embedded in error codes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database => "DB",
            Self::Phsa => "PHSA",
            Self::Bcmp => "BCMP",
            Self::Keycloak => "KEYC",
            Self::Cdogs => "CDOGS",
            Self::Laboratory => "LAB",
            Self::Immunization => "IMMS",
            Self::Patient => "PAT",
        }
    }
}

/// Prefix shared by every error code.
pub const ERROR_CODE_PREFIX: &str = "HG";

/// Builds error codes and errors in a consistent format.
pub struct ErrorTranslator;

impl ErrorTranslator {
    /// Error code for a failure while talking to `service`.
    pub fn service_error(error_type: ErrorType, service: ServiceType) -> String {
        format!(
            "{}-{}-{}",
            ERROR_CODE_PREFIX,
            error_type.code(),
            service.code()
        )
    }

    /// Error code for a failure inside the gateway itself.
    pub fn internal_error(error_type: ErrorType) -> String {
        format!("{}-{}", ERROR_CODE_PREFIX, error_type.code())
    }

    /// Error describing an action the caller must take.
    pub fn action_required(message: impl Into<String>, action: ActionType) -> RequestResultError {
        RequestResultError {
            result_message: message.into(),
            error_code: format!("{}-ACTION-{}", ERROR_CODE_PREFIX, action.code()),
            action_code: Some(action),
        }
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// Error details attached to a non-successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResultError {
    /// Human-readable message.
    pub result_message: String,
    /// Stable error code, see [`ErrorTranslator`].
    pub error_code: String,
    /// Action the caller should take, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_code: Option<ActionType>,
}

impl RequestResultError {
    /// Create an error with a message and code and no action.
    pub fn new(message: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            result_message: message.into(),
            error_code: error_code.into(),
            action_code: None,
        }
    }
}

/// Result envelope wrapping a service payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResult<T> {
    /// Payload, present on success and sometimes alongside an error.
    pub resource_payload: Option<T>,
    /// Total number of results available.
    pub total_result_count: Option<i64>,
    /// Page index of this result.
    pub page_index: Option<i64>,
    /// Page size used for this result.
    pub page_size: Option<i64>,
    /// Outcome.
    pub result_status: ResultType,
    /// Error details when the status is not `Success`.
    pub result_error: Option<RequestResultError>,
}

impl<T> Default for RequestResult<T> {
    /// An error result with nothing set. Delegates start from this and
    /// upgrade it on success.
    fn default() -> Self {
        Self {
            resource_payload: None,
            total_result_count: None,
            page_index: None,
            page_size: None,
            result_status: ResultType::Error,
            result_error: None,
        }
    }
}

impl<T> RequestResult<T> {
    /// Successful result with a single payload.
    pub fn success(payload: T) -> Self {
        Self {
            resource_payload: Some(payload),
            total_result_count: Some(1),
            result_status: ResultType::Success,
            ..Self::default()
        }
    }

    /// Successful paged result.
    pub fn success_page(payload: T, total: i64, page_index: i64, page_size: i64) -> Self {
        Self {
            resource_payload: Some(payload),
            total_result_count: Some(total),
            page_index: Some(page_index),
            page_size: Some(page_size),
            result_status: ResultType::Success,
            result_error: None,
        }
    }

    /// Error result for a failure inside the gateway.
    pub fn error(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self::with_error(RequestResultError::new(
            message,
            ErrorTranslator::internal_error(error_type),
        ))
    }

    /// Error result for a failure while talking to `service`.
    pub fn service_error(
        error_type: ErrorType,
        service: ServiceType,
        message: impl Into<String>,
    ) -> Self {
        Self::with_error(RequestResultError::new(
            message,
            ErrorTranslator::service_error(error_type, service),
        ))
    }

    /// Error result carrying prepared error details.
    pub fn with_error(error: RequestResultError) -> Self {
        Self {
            result_error: Some(error),
            ..Self::default()
        }
    }

    /// Result asking the caller to take `action`.
    pub fn action_required(action: ActionType, message: impl Into<String>) -> Self {
        Self {
            result_status: ResultType::ActionRequired,
            result_error: Some(ErrorTranslator::action_required(message, action)),
            ..Self::default()
        }
    }

    /// Whether the status is `Success`.
    pub fn is_success(&self) -> bool {
        self.result_status == ResultType::Success
    }

    /// Transform the payload, keeping status, paging and error.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RequestResult<U> {
        RequestResult {
            resource_payload: self.resource_payload.map(f),
            total_result_count: self.total_result_count,
            page_index: self.page_index,
            page_size: self.page_size,
            result_status: self.result_status,
            result_error: self.result_error,
        }
    }

    /// Carry status, paging and error over to a result with a different payload type,
    /// dropping the payload.
    pub fn without_payload<U>(self) -> RequestResult<U> {
        RequestResult {
            resource_payload: None,
            total_result_count: self.total_result_count,
            page_index: self.page_index,
            page_size: self.page_size,
            result_status: self.result_status,
            result_error: self.result_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_code_format() {
        let code = ErrorTranslator::service_error(ErrorType::CommunicationExternal, ServiceType::Bcmp);
        assert_eq!(code, "HG-CE-BCMP");
    }

    #[test]
    fn test_internal_error_code_format() {
        assert_eq!(ErrorTranslator::internal_error(ErrorType::InvalidState), "HG-IS");
    }

    #[test]
    fn test_default_is_error_without_details() {
        let result: RequestResult<String> = RequestResult::default();
        assert_eq!(result.result_status, ResultType::Error);
        assert!(result.result_error.is_none());
        assert!(result.resource_payload.is_none());
    }

    #[test]
    fn test_action_required_carries_action() {
        let result: RequestResult<()> =
            RequestResult::action_required(ActionType::Refresh, "not yet available");
        assert_eq!(result.result_status, ResultType::ActionRequired);
        let error = result.result_error.unwrap();
        assert_eq!(error.action_code, Some(ActionType::Refresh));
        assert_eq!(error.error_code, "HG-ACTION-REFRESH");
    }

    #[test]
    fn test_map_keeps_metadata() {
        let result = RequestResult::success_page(vec![1, 2, 3], 3, 0, 25);
        let mapped = result.map(|v| v.len());
        assert_eq!(mapped.resource_payload, Some(3));
        assert_eq!(mapped.total_result_count, Some(3));
        assert_eq!(mapped.page_size, Some(25));
        assert!(mapped.is_success());
    }

    #[test]
    fn test_serializes_camel_case() {
        let result = RequestResult::success("payload".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["resultStatus"], "Success");
        assert_eq!(json["resourcePayload"], "payload");
        assert_eq!(json["totalResultCount"], 1);
        assert!(json["resultError"].is_null());
    }
}
