//! PHSA immunization delegate.

use async_trait::async_trait;
use gateway_core::health::{ImmunizationResponse, PhsaResult};
use gateway_core::{ErrorType, Hdid, RequestResult, ServiceType};
use reqwest::Client;

use super::{UpstreamError, read_json};
use crate::http::segment_url;

/// Fetches immunizations from PHSA.
#[async_trait]
pub trait ImmunizationDelegate: Send + Sync {
    /// Immunizations for `hdid`, page `page_index`.
    async fn get_immunizations(
        &self,
        hdid: &Hdid,
        page_index: i64,
    ) -> RequestResult<PhsaResult<Vec<ImmunizationResponse>>>;
}

/// [`ImmunizationDelegate`] over the PHSA REST API.
#[derive(Debug, Clone)]
pub struct RestImmunizationDelegate {
    client: Client,
    base_url: String,
}

impl RestImmunizationDelegate {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch(
        &self,
        hdid: &Hdid,
        page_index: i64,
    ) -> Result<PhsaResult<Vec<ImmunizationResponse>>, UpstreamError> {
        let url = segment_url(&self.base_url, &["immunizations", hdid.as_str()])?;
        let response = self
            .client
            .get(url)
            .query(&[("pageIndex", page_index)])
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl ImmunizationDelegate for RestImmunizationDelegate {
    async fn get_immunizations(
        &self,
        hdid: &Hdid,
        page_index: i64,
    ) -> RequestResult<PhsaResult<Vec<ImmunizationResponse>>> {
        tracing::debug!(page_index, "Fetching immunizations from PHSA");

        let outcome = self.fetch(hdid, page_index).await;

        match outcome {
            Ok(phsa) => {
                let total = phsa.result.as_ref().map_or(0, |r| r.len() as i64);
                RequestResult::success_page(phsa, total, page_index, total)
            }
            Err(e) => {
                tracing::error!(error = %e, "Unable to fetch immunizations from PHSA");
                let message = match e {
                    UpstreamError::Status(status) => format!(
                        "Unable to connect to Immunizations Endpoint, HTTP Error {}",
                        status
                    ),
                    UpstreamError::InvalidResponse(_) => "Error with JSON data".to_string(),
                    UpstreamError::Transport(e) => format!("Error with HTTP Request: {}", e),
                    UpstreamError::InvalidUrl(e) => format!("Error with HTTP Request: {}", e),
                };
                RequestResult::service_error(
                    ErrorType::CommunicationExternal,
                    ServiceType::Immunization,
                    message,
                )
            }
        }
    }
}
