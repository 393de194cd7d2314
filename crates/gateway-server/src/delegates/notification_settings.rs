//! PHSA notification settings delegate.

use async_trait::async_trait;
use gateway_core::health::{NotificationSettingsRequest, NotificationSettingsResponse};
use gateway_core::{ErrorTranslator, ErrorType, Hdid, RequestResult, RequestResultError, ServiceType};
use reqwest::Client;

use super::{UpstreamError, read_json};
use crate::http::segment_url;

/// Pushes notification preferences to PHSA.
#[async_trait]
pub trait NotificationSettingsDelegate: Send + Sync {
    /// Store `settings` for `hdid`, calling PHSA on behalf of `bearer_token`.
    async fn set_notification_settings(
        &self,
        hdid: &Hdid,
        settings: &NotificationSettingsRequest,
        bearer_token: &str,
    ) -> RequestResult<NotificationSettingsResponse>;
}

/// [`NotificationSettingsDelegate`] over the PHSA REST API.
#[derive(Debug, Clone)]
pub struct RestNotificationSettingsDelegate {
    client: Client,
    base_url: String,
}

impl RestNotificationSettingsDelegate {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn put(
        &self,
        hdid: &Hdid,
        settings: &NotificationSettingsRequest,
        bearer_token: &str,
    ) -> Result<NotificationSettingsResponse, UpstreamError> {
        let url = segment_url(&self.base_url, &["notificationSettings", hdid.as_str()])?;
        let response = self
            .client
            .put(url)
            .bearer_auth(bearer_token)
            .json(settings)
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl NotificationSettingsDelegate for RestNotificationSettingsDelegate {
    async fn set_notification_settings(
        &self,
        hdid: &Hdid,
        settings: &NotificationSettingsRequest,
        bearer_token: &str,
    ) -> RequestResult<NotificationSettingsResponse> {
        tracing::debug!("Sending notification settings update to PHSA");

        match self.put(hdid, settings, bearer_token).await {
            Ok(response) => RequestResult::success(response),
            Err(e) => {
                tracing::error!(error = %e, "Error sending notification settings update to PHSA");
                let error_type = match e {
                    UpstreamError::Status(422) => ErrorType::SmsInvalid,
                    _ => ErrorType::CommunicationExternal,
                };
                RequestResult::with_error(RequestResultError::new(
                    "Error while sending notification settings to PHSA",
                    ErrorTranslator::service_error(error_type, ServiceType::Phsa),
                ))
            }
        }
    }
}
