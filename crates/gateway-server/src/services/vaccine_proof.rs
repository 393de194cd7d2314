//! Vaccine proofs generated or mailed by BC Mail Plus.

use std::sync::Arc;

use gateway_core::health::{
    Address, ReportModel, VaccineProofRequest, VaccineProofResponse, VaccineProofTemplate,
};
use gateway_core::{ErrorType, RequestResult};

use crate::delegates::VaccineProofDelegate;

/// Message returned for a proof request without a QR code.
pub const MISSING_QR_MESSAGE: &str = "SMART Health Card QR code is required";

#[derive(Clone)]
pub struct VaccineProofService {
    delegate: Arc<dyn VaccineProofDelegate>,
}

impl VaccineProofService {
    pub fn new(delegate: Arc<dyn VaccineProofDelegate>) -> Self {
        Self { delegate }
    }

    /// Start a proof job whose document is fetched later with [`Self::get_asset`].
    pub async fn generate(
        &self,
        template: VaccineProofTemplate,
        request: &VaccineProofRequest,
    ) -> RequestResult<VaccineProofResponse> {
        if request.smart_health_card_qr.trim().is_empty() {
            return RequestResult::error(ErrorType::InvalidState, MISSING_QR_MESSAGE);
        }
        tracing::info!(?template, status = ?request.status, "Generating vaccine proof");
        self.delegate.generate(template, request).await
    }

    /// Start a proof job that is printed and mailed to `address`.
    pub async fn mail(
        &self,
        template: VaccineProofTemplate,
        request: &VaccineProofRequest,
        address: &Address,
    ) -> RequestResult<VaccineProofResponse> {
        if request.smart_health_card_qr.trim().is_empty() {
            return RequestResult::error(ErrorType::InvalidState, MISSING_QR_MESSAGE);
        }
        tracing::info!(?template, status = ?request.status, "Mailing vaccine proof");
        self.delegate.mail(template, request, address).await
    }

    pub async fn get_asset(&self, asset_uri: &str) -> RequestResult<ReportModel> {
        self.delegate.get_asset(asset_uri).await
    }
}
