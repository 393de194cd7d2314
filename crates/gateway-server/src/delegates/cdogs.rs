//! Common Document Generation Service (CDOGS) delegate.

use async_trait::async_trait;
use gateway_core::health::CdogsRequest;
use reqwest::Client;

use super::{UpstreamError, check_status};
use crate::http::join_url;

/// Renders templates into documents.
#[async_trait]
pub trait CdogsDelegate: Send + Sync {
    /// Render `request` and return the document bytes.
    async fn render(&self, request: &CdogsRequest) -> Result<Vec<u8>, UpstreamError>;
}

/// [`CdogsDelegate`] over the CDOGS REST API.
#[derive(Debug, Clone)]
pub struct RestCdogsDelegate {
    client: Client,
    base_url: String,
}

impl RestCdogsDelegate {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CdogsDelegate for RestCdogsDelegate {
    async fn render(&self, request: &CdogsRequest) -> Result<Vec<u8>, UpstreamError> {
        let url = join_url(&self.base_url, "template/render");
        tracing::debug!(
            report_name = %request.options.report_name,
            convert_to = %request.options.convert_to,
            "Rendering report with CDOGS"
        );

        let response = self.client.post(&url).json(request).send().await?;
        let response = check_status(response)?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(UpstreamError::InvalidResponse(
                "CDOGS returned an empty document".to_string(),
            ));
        }
        Ok(bytes.to_vec())
    }
}
