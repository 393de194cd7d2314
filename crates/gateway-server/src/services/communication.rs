//! Communications managed by administrators: banners, in-app messages and
//! emails.

use std::sync::Arc;

use chrono::Utc;
use gateway_core::{Communication, ErrorType, RequestResult, ResultType, ServiceType};
use gateway_store::{CommunicationDelegate, DbResult, DbStatusCode};
use uuid::Uuid;

/// Message returned when a communication would expire before it starts.
pub const INVALID_DATES_MESSAGE: &str = "Effective Date should be before Expiry Date.";

#[derive(Clone)]
pub struct CommunicationService {
    communications: Arc<dyn CommunicationDelegate>,
}

impl CommunicationService {
    pub fn new(communications: Arc<dyn CommunicationDelegate>) -> Self {
        Self { communications }
    }

    pub async fn add(&self, communication: &Communication) -> RequestResult<Communication> {
        if !communication.has_valid_dates() {
            return invalid_dates();
        }
        tracing::debug!(subject = %communication.subject, "Adding communication");
        let result = self.communications.add(communication).await;
        to_request_result(result, DbStatusCode::Created)
    }

    pub async fn update(&self, communication: &Communication) -> RequestResult<Communication> {
        if !communication.has_valid_dates() {
            return invalid_dates();
        }
        tracing::debug!(id = %communication.id, "Updating communication");
        let result = self.communications.update(communication).await;
        to_request_result(result, DbStatusCode::Updated)
    }

    pub async fn delete(&self, id: Uuid) -> RequestResult<Communication> {
        tracing::debug!(id = %id, "Deleting communication");
        let result = self.communications.delete(id).await;
        to_request_result(result, DbStatusCode::Deleted)
    }

    pub async fn get_all(&self) -> RequestResult<Vec<Communication>> {
        let result = self.communications.get_all().await;
        let count = result.payload.as_ref().map_or(0, |all| all.len() as i64);
        let mut mapped = to_request_result(result, DbStatusCode::Read);
        if mapped.is_success() {
            mapped.total_result_count = Some(count);
        }
        mapped
    }

    /// The banner to show now. A missing banner is a success with no payload.
    pub async fn get_active_banner(&self) -> RequestResult<Communication> {
        let result = self.communications.get_active_banner(Utc::now()).await;
        if result.is(DbStatusCode::NotFound) {
            return RequestResult {
                result_status: ResultType::Success,
                total_result_count: Some(0),
                ..RequestResult::default()
            };
        }
        to_request_result(result, DbStatusCode::Read)
    }
}

fn invalid_dates<T>() -> RequestResult<T> {
    RequestResult::error(ErrorType::InvalidState, INVALID_DATES_MESSAGE)
}

fn to_request_result<T>(result: DbResult<T>, expected: DbStatusCode) -> RequestResult<T> {
    match result.payload {
        Some(payload) if result.status == expected => RequestResult::success(payload),
        _ => {
            tracing::warn!(status = ?result.status, message = %result.message, "Communication operation failed");
            RequestResult::service_error(
                ErrorType::CommunicationInternal,
                ServiceType::Database,
                result.message,
            )
        }
    }
}
