//! Notification preferences pushed to PHSA.

use std::sync::Arc;

use gateway_core::health::{NotificationSettingsRequest, NotificationSettingsResponse};
use gateway_core::{ErrorTranslator, ErrorType, Hdid, RequestResult, RequestResultError, ServiceType};

use crate::delegates::NotificationSettingsDelegate;

#[derive(Clone)]
pub struct NotificationSettingsService {
    delegate: Arc<dyn NotificationSettingsDelegate>,
}

impl NotificationSettingsService {
    pub fn new(delegate: Arc<dyn NotificationSettingsDelegate>) -> Self {
        Self { delegate }
    }

    /// Send `settings` to PHSA on behalf of the caller's `bearer_token`.
    ///
    /// Enabling a channel without an address is rejected before PHSA is called.
    pub async fn set_notification_settings(
        &self,
        hdid: &Hdid,
        settings: &NotificationSettingsRequest,
        bearer_token: &str,
    ) -> RequestResult<NotificationSettingsResponse> {
        if settings.sms_enabled && is_blank(&settings.sms_number) {
            return invalid(ErrorType::SmsInvalid, "SMS number is required when SMS is enabled");
        }
        if settings.email_enabled && is_blank(&settings.email_address) {
            return invalid(
                ErrorType::EmailInvalid,
                "Email address is required when email is enabled",
            );
        }

        tracing::info!(
            email_enabled = settings.email_enabled,
            sms_enabled = settings.sms_enabled,
            "Updating notification settings"
        );
        self.delegate
            .set_notification_settings(hdid, settings, bearer_token)
            .await
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn invalid<T>(error_type: ErrorType, message: &str) -> RequestResult<T> {
    RequestResult::with_error(RequestResultError::new(
        message,
        ErrorTranslator::service_error(error_type, ServiceType::Phsa),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegates::mock::MockNotificationSettingsDelegate;
    use gateway_core::ResultType;

    fn settings() -> NotificationSettingsRequest {
        NotificationSettingsRequest {
            email_enabled: true,
            email_address: Some("user@example.com".into()),
            sms_enabled: true,
            sms_number: Some("2505551234".into()),
            sms_verification_code: None,
            sms_verified: false,
        }
    }

    #[tokio::test]
    async fn test_forwards_settings_and_token() {
        let delegate = Arc::new(MockNotificationSettingsDelegate::new());
        let service = NotificationSettingsService::new(delegate.clone());
        let hdid = Hdid::from("HDID-1");

        let result = service
            .set_notification_settings(&hdid, &settings(), "token-123")
            .await;

        assert_eq!(result.result_status, ResultType::Success);
        assert_eq!(
            result.resource_payload.unwrap().sms_number.as_deref(),
            Some("2505551234")
        );
        let received = delegate.received().await;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].hdid, hdid);
        assert_eq!(received[0].bearer_token, "token-123");
    }

    #[tokio::test]
    async fn test_sms_without_number_is_rejected() {
        let delegate = Arc::new(MockNotificationSettingsDelegate::new());
        let service = NotificationSettingsService::new(delegate.clone());
        let request = NotificationSettingsRequest {
            sms_number: Some(" ".into()),
            ..settings()
        };

        let result = service
            .set_notification_settings(&Hdid::from("HDID-1"), &request, "token")
            .await;

        assert_eq!(result.result_status, ResultType::Error);
        assert_eq!(result.result_error.unwrap().error_code, "HG-SI-PHSA");
        assert!(delegate.received().await.is_empty());
    }

    #[tokio::test]
    async fn test_delegate_error_passes_through() {
        let delegate = Arc::new(MockNotificationSettingsDelegate::new());
        delegate
            .set_response(RequestResult::service_error(
                ErrorType::CommunicationExternal,
                ServiceType::Phsa,
                "Error while sending notification settings to PHSA",
            ))
            .await;
        let service = NotificationSettingsService::new(delegate);

        let result = service
            .set_notification_settings(&Hdid::from("HDID-1"), &settings(), "token")
            .await;

        assert_eq!(result.result_error.unwrap().error_code, "HG-CE-PHSA");
    }
}
