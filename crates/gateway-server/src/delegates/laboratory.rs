//! PHSA laboratory delegate for unauthenticated COVID-19 test lookups.

use async_trait::async_trait;
use gateway_core::health::{PublicCovidTestQuery, PublicCovidTestResponse};
use gateway_core::{ErrorType, RequestResult, ServiceType};
use reqwest::Client;

use super::{UpstreamError, read_json};
use crate::http::join_url;

/// Looks up public COVID-19 test results.
#[async_trait]
pub trait LaboratoryDelegate: Send + Sync {
    async fn get_public_test_results(
        &self,
        query: &PublicCovidTestQuery,
    ) -> RequestResult<PublicCovidTestResponse>;
}

/// [`LaboratoryDelegate`] over the PHSA REST API.
#[derive(Debug, Clone)]
pub struct RestLaboratoryDelegate {
    client: Client,
    base_url: String,
}

impl RestLaboratoryDelegate {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn post(&self, query: &PublicCovidTestQuery) -> Result<PublicCovidTestResponse, UpstreamError> {
        let url = join_url(&self.base_url, "public/covid-tests");
        let response = self.client.post(&url).json(query).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl LaboratoryDelegate for RestLaboratoryDelegate {
    async fn get_public_test_results(
        &self,
        query: &PublicCovidTestQuery,
    ) -> RequestResult<PublicCovidTestResponse> {
        match self.post(query).await {
            Ok(response) => {
                let count = response.records.len() as i64;
                let mut result = RequestResult::success(response);
                result.total_result_count = Some(count);
                result
            }
            Err(e) => {
                tracing::error!(error = %e, "Unable to retrieve public COVID-19 test results");
                RequestResult::service_error(
                    ErrorType::CommunicationExternal,
                    ServiceType::Laboratory,
                    "Error while retrieving COVID-19 test results",
                )
            }
        }
    }
}
