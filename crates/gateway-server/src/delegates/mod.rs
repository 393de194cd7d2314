//! Delegates for external REST services.
//!
//! Each module defines an `async_trait` delegate used by the services and a
//! `Rest*` implementation over a shared `reqwest::Client`.

pub mod cdogs;
pub mod immunization;
pub mod keycloak;
pub mod laboratory;
pub mod mock;
pub mod notification_settings;
pub mod patient;
pub mod vaccine_proof;

pub use cdogs::{CdogsDelegate, RestCdogsDelegate};
pub use immunization::{ImmunizationDelegate, RestImmunizationDelegate};
pub use keycloak::{KeycloakAdminDelegate, RestKeycloakAdminDelegate};
pub use laboratory::{LaboratoryDelegate, RestLaboratoryDelegate};
pub use notification_settings::{NotificationSettingsDelegate, RestNotificationSettingsDelegate};
pub use patient::{PatientRepository, RestPatientRepository};
pub use vaccine_proof::{RestVaccineProofDelegate, VaccineProofDelegate};

/// Failure talking to an upstream service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Request could not be sent or the response not read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with an unexpected status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Upstream answered with a body that could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request URL could not be built.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

/// Turn a non-success response into [`UpstreamError::Status`].
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        tracing::warn!(status = status.as_u16(), url = %response.url(), "Upstream returned error status");
        Err(UpstreamError::Status(status.as_u16()))
    }
}

/// Check the status of `response` and deserialize its JSON body.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    let response = check_status(response)?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
}
