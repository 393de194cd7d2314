//! Public COVID-19 test lookups.

use std::sync::Arc;

use gateway_core::health::{PublicCovidTestQuery, PublicCovidTestResponse};
use gateway_core::{ActionType, ErrorTranslator, RequestResult, ResultType};

use crate::delegates::LaboratoryDelegate;

#[derive(Clone)]
pub struct LaboratoryService {
    delegate: Arc<dyn LaboratoryDelegate>,
}

impl LaboratoryService {
    pub fn new(delegate: Arc<dyn LaboratoryDelegate>) -> Self {
        Self { delegate }
    }

    /// Test results for the identity in `query`.
    ///
    /// While PHSA is still loading the results the status is
    /// `ActionRequired` with a `Refresh` action, and the payload carries the
    /// suggested retry delay.
    pub async fn get_public_test_results(
        &self,
        query: &PublicCovidTestQuery,
    ) -> RequestResult<PublicCovidTestResponse> {
        let mut result = self.delegate.get_public_test_results(query).await;

        let retry_in = match &result.resource_payload {
            Some(response) if result.is_success() && !response.loaded => response.retry_in,
            _ => return result,
        };

        tracing::debug!(retry_in, "Public COVID-19 test results not loaded");
        result.result_status = ResultType::ActionRequired;
        result.result_error = Some(ErrorTranslator::action_required(
            format!("Test results are still loading, retry in {} ms", retry_in),
            ActionType::Refresh,
        ));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegates::mock::MockLaboratoryDelegate;
    use chrono::NaiveDate;
    use gateway_core::{ErrorType, ServiceType};

    fn query() -> PublicCovidTestQuery {
        PublicCovidTestQuery {
            phn: "9735353315".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1967, 6, 2).unwrap(),
            collection_date: NaiveDate::from_ymd_opt(2021, 4, 4).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_loaded_is_success() {
        let service = LaboratoryService::new(Arc::new(MockLaboratoryDelegate::new()));

        let result = service.get_public_test_results(&query()).await;

        assert_eq!(result.result_status, ResultType::Success);
        assert!(result.result_error.is_none());
    }

    #[tokio::test]
    async fn test_not_loaded_requires_refresh() {
        let delegate = Arc::new(MockLaboratoryDelegate::new());
        delegate
            .set_response(RequestResult::success(PublicCovidTestResponse {
                loaded: false,
                retry_in: 5000,
                records: Vec::new(),
            }))
            .await;
        let service = LaboratoryService::new(delegate);

        let result = service.get_public_test_results(&query()).await;

        assert_eq!(result.result_status, ResultType::ActionRequired);
        assert_eq!(result.resource_payload.unwrap().retry_in, 5000);
        let error = result.result_error.unwrap();
        assert_eq!(error.action_code, Some(ActionType::Refresh));
        assert_eq!(error.error_code, "HG-ACTION-REFRESH");
        assert!(error.result_message.contains("5000"));
    }

    #[tokio::test]
    async fn test_error_passes_through() {
        let delegate = Arc::new(MockLaboratoryDelegate::new());
        delegate
            .set_response(RequestResult::service_error(
                ErrorType::CommunicationExternal,
                ServiceType::Laboratory,
                "Error while retrieving COVID-19 test results",
            ))
            .await;
        let service = LaboratoryService::new(delegate);

        let result = service.get_public_test_results(&query()).await;

        assert_eq!(result.result_status, ResultType::Error);
        assert_eq!(result.result_error.unwrap().error_code, "HG-CE-LAB");
    }
}
