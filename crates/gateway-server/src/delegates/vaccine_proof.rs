//! BC Mail Plus delegate: vaccine proof generation and mailing.
//!
//! Every call is a single request. Failures are never retried; they are
//! returned as an error result coded `HG-CE-BCMP`.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use gateway_core::health::{
    Address, ReportModel, VaccineProofRequest, VaccineProofRequestStatus, VaccineProofResponse,
    VaccineProofTemplate, VaccineState,
};
use gateway_core::{ActionType, ErrorType, RequestResult, ServiceType};
use reqwest::{Client, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::BcmpConfig;
use crate::http::same_origin;

/// Prefix BC Mail Plus puts on a 200 body to report a failure.
pub const ERROR_SENTINEL: &str = "ERROR: ";

/// File name given to downloaded proofs.
pub const VACCINE_PROOF_FILE_NAME: &str = "VaccineProof.pdf";

/// Generates vaccine proofs and mails them to patients.
#[async_trait]
pub trait VaccineProofDelegate: Send + Sync {
    /// Generate a proof and mail it to `address`.
    async fn mail(
        &self,
        template: VaccineProofTemplate,
        request: &VaccineProofRequest,
        address: &Address,
    ) -> RequestResult<VaccineProofResponse>;

    /// Generate a proof for download.
    async fn generate(
        &self,
        template: VaccineProofTemplate,
        request: &VaccineProofRequest,
    ) -> RequestResult<VaccineProofResponse>;

    /// Download a generated proof.
    async fn get_asset(&self, asset_uri: &str) -> RequestResult<ReportModel>;
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BcmpVaccineProofQuery {
    schema_version: String,
    operation: &'static str,
    vaccine_status: VaccineState,
    smart_health_card: BcmpSmartHealthCard,
    templates: Vec<VaccineProofTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<BcmpAddress>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BcmpSmartHealthCard {
    qr_code: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BcmpAddress {
    address_line1: String,
    address_line2: String,
    city: String,
    province: String,
    postal_code: String,
    country: String,
}

impl From<&Address> for BcmpAddress {
    fn from(address: &Address) -> Self {
        let mut lines = address.street_lines.iter();
        let first = lines.next().cloned().unwrap_or_default();
        let rest: Vec<&str> = lines.map(String::as_str).collect();

        Self {
            address_line1: first,
            address_line2: rest.join("\n"),
            city: address.city.clone(),
            province: address.state.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BcmpJobStatusResult {
    job_id: String,
    job_status: String,
    #[serde(default)]
    job_properties: BcmpJobProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BcmpJobProperties {
    asset_uri: Option<String>,
}

fn job_status(status: &str) -> VaccineProofRequestStatus {
    match status {
        "Started" => VaccineProofRequestStatus::Started,
        "Completed" => VaccineProofRequestStatus::Completed,
        _ => VaccineProofRequestStatus::Unknown,
    }
}

fn bcmp_error<T>(message: impl Into<String>) -> RequestResult<T> {
    let mut result = RequestResult::service_error(
        ErrorType::CommunicationExternal,
        ServiceType::Bcmp,
        message,
    );
    result.page_index = Some(0);
    result
}

// ============================================================================
// REST Implementation
// ============================================================================

/// [`VaccineProofDelegate`] over the BC Mail Plus REST API.
#[derive(Debug, Clone)]
pub struct RestVaccineProofDelegate {
    client: Client,
    config: BcmpConfig,
}

impl RestVaccineProofDelegate {
    pub fn new(client: Client, config: BcmpConfig) -> Self {
        Self { client, config }
    }

    /// `asset_uri` parsed, when BC Mail Plus serves it.
    fn asset_url(&self, asset_uri: &str) -> Option<Url> {
        let origin = Url::parse(&self.config.endpoint).ok()?;
        let asset = Url::parse(asset_uri).ok()?;
        same_origin(&origin, &asset).then_some(asset)
    }

    fn create_endpoint(&self) -> String {
        format!("{}create:{}", self.config.endpoint, self.config.job_class)
    }

    fn query(
        &self,
        operation: &'static str,
        template: VaccineProofTemplate,
        request: &VaccineProofRequest,
        address: Option<&Address>,
    ) -> BcmpVaccineProofQuery {
        BcmpVaccineProofQuery {
            schema_version: self.config.schema_version.clone(),
            operation,
            vaccine_status: request.status,
            smart_health_card: BcmpSmartHealthCard {
                qr_code: request.smart_health_card_qr.clone(),
            },
            templates: vec![template],
            address: address.map(BcmpAddress::from),
        }
    }

    /// POST a job and interpret the answer.
    async fn post<T: DeserializeOwned>(&self, query: &BcmpVaccineProofQuery) -> RequestResult<T> {
        let endpoint = self.create_endpoint();

        let response = match self
            .client
            .post(&endpoint)
            .header(header::ACCEPT, "application/json")
            .json(query)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Unexpected exception while sending HTTP request to BC Mail Plus");
                return bcmp_error(format!(
                    "Exception while sending HTTP request to BC Mail Plus: {}",
                    e
                ));
            }
        };

        let status = response.status();
        let payload = match response.text().await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Unable to read BC Mail Plus response");
                return bcmp_error(format!(
                    "Exception while sending HTTP request to BC Mail Plus: {}",
                    e
                ));
            }
        };

        if status != StatusCode::OK {
            tracing::warn!(
                status = status.as_u16(),
                endpoint = %endpoint,
                payload = %payload,
                "Unexpected HTTP response from BC Mail Plus"
            );
            return bcmp_error(format!(
                "Unable to connect to BC Mail Plus Endpoint, HTTP Error {}",
                status
            ));
        }

        if payload.starts_with(ERROR_SENTINEL) {
            tracing::warn!(payload = %payload, "BC Mail Plus reported an error");
            return bcmp_error("Error encountered from BC Mail Plus");
        }

        match serde_json::from_str::<T>(&payload) {
            Ok(value) => {
                let mut result = RequestResult::success(value);
                result.page_index = Some(0);
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, "BC Mail Plus returned unreadable JSON");
                bcmp_error("Error with JSON data")
            }
        }
    }

    /// Map a job status result, carrying status and error over on failure.
    fn to_response(
        result: RequestResult<BcmpJobStatusResult>,
        with_asset: bool,
    ) -> RequestResult<VaccineProofResponse> {
        let page_index = result.page_index;
        match result.resource_payload {
            Some(job) => {
                tracing::debug!(job_id = %job.job_id, job_status = %job.job_status, "BC Mail Plus accepted job");
                let mut mapped = RequestResult::success(VaccineProofResponse {
                    status: job_status(&job.job_status),
                    id: job.job_id,
                    asset_uri: if with_asset {
                        job.job_properties.asset_uri
                    } else {
                        None
                    },
                });
                mapped.page_index = page_index;
                mapped
            }
            None => {
                if let Some(error) = &result.result_error {
                    tracing::warn!(
                        error_code = %error.error_code,
                        message = %error.result_message,
                        "BC Mail Plus job failed"
                    );
                }
                result.without_payload()
            }
        }
    }
}

#[async_trait]
impl VaccineProofDelegate for RestVaccineProofDelegate {
    async fn mail(
        &self,
        template: VaccineProofTemplate,
        request: &VaccineProofRequest,
        address: &Address,
    ) -> RequestResult<VaccineProofResponse> {
        tracing::debug!("Requesting BC Mail Plus generate and mail a vaccine proof");
        let query = self.query("Mail", template, request, Some(address));
        Self::to_response(self.post(&query).await, false)
    }

    async fn generate(
        &self,
        template: VaccineProofTemplate,
        request: &VaccineProofRequest,
    ) -> RequestResult<VaccineProofResponse> {
        tracing::debug!("Sending request to BC Mail Plus to generate a vaccine proof");
        let query = self.query("Generate", template, request, None);
        Self::to_response(self.post(&query).await, true)
    }

    async fn get_asset(&self, asset_uri: &str) -> RequestResult<ReportModel> {
        let Some(url) = self.asset_url(asset_uri) else {
            tracing::warn!(asset_uri = %asset_uri, "Refusing to fetch vaccine proof from outside BC Mail Plus");
            return RequestResult::error(
                ErrorType::InvalidState,
                "Asset URI is not served by BC Mail Plus",
            );
        };

        let response = match self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Unexpected exception while fetching Vaccine Proof");
                return bcmp_error(format!("Exception while fetching Vaccine Proof: {}", e));
            }
        };

        match response.status() {
            StatusCode::OK => match response.bytes().await {
                Ok(bytes) if !bytes.is_empty() => {
                    let mut result = RequestResult::success(ReportModel {
                        file_name: VACCINE_PROOF_FILE_NAME.to_string(),
                        data: BASE64.encode(&bytes),
                    });
                    result.page_index = Some(0);
                    result
                }
                Ok(_) => bcmp_error("Empty file returned from BC Mail Plus"),
                Err(e) => {
                    tracing::error!(error = %e, "Unexpected exception while fetching Vaccine Proof");
                    bcmp_error(format!("Exception while fetching Vaccine Proof: {}", e))
                }
            },
            StatusCode::NOT_FOUND => {
                let mut result = RequestResult::action_required(
                    ActionType::Refresh,
                    "Vaccine Proof is not yet available",
                );
                result.page_index = Some(0);
                result
            }
            status => bcmp_error(format!(
                "HTTP Error {} encountered from BC Mail Plus",
                status
            )),
        }
    }
}
