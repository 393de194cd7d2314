//! Vaccine proof routes.
//!
//! - POST /api/vaccine-proof/{hdid}/generate - Start a downloadable proof
//! - POST /api/vaccine-proof/{hdid}/mail - Start a mailed proof
//! - GET /api/vaccine-proof/asset?uri= - Fetch a generated proof
//!
//! Starting a proof needs `Immunization` read access to the patient.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use gateway_core::health::{
    Address, ReportModel, VaccineProofRequest, VaccineProofResponse, VaccineProofTemplate,
};
use gateway_core::{FhirRequirement, FhirResource, Hdid, RequestResult};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Identity, require_fhir};
use crate::state::AppState;

/// Body of POST /api/vaccine-proof/{hdid}/generate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProofBody {
    #[serde(default)]
    pub template: VaccineProofTemplate,
    #[serde(flatten)]
    pub request: VaccineProofRequest,
}

/// Body of POST /api/vaccine-proof/{hdid}/mail.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailProofBody {
    #[serde(default)]
    pub template: VaccineProofTemplate,
    #[serde(flatten)]
    pub request: VaccineProofRequest,
    pub address: Address,
}

#[derive(Debug, Deserialize)]
pub struct AssetQuery {
    pub uri: String,
}

async fn generate_proof(
    State(state): State<AppState>,
    identity: Identity,
    Path(hdid): Path<Hdid>,
    Json(body): Json<GenerateProofBody>,
) -> ApiResult<Json<RequestResult<VaccineProofResponse>>> {
    require_fhir(
        &identity,
        FhirRequirement::read(FhirResource::Immunization),
        &hdid,
    )?;
    Ok(Json(
        state
            .vaccine_proofs()
            .generate(body.template, &body.request)
            .await,
    ))
}

async fn mail_proof(
    State(state): State<AppState>,
    identity: Identity,
    Path(hdid): Path<Hdid>,
    Json(body): Json<MailProofBody>,
) -> ApiResult<Json<RequestResult<VaccineProofResponse>>> {
    require_fhir(
        &identity,
        FhirRequirement::read(FhirResource::Immunization),
        &hdid,
    )?;
    Ok(Json(
        state
            .vaccine_proofs()
            .mail(body.template, &body.request, &body.address)
            .await,
    ))
}

async fn get_asset(
    State(state): State<AppState>,
    _identity: Identity,
    Query(query): Query<AssetQuery>,
) -> ApiResult<Json<RequestResult<ReportModel>>> {
    if query.uri.trim().is_empty() {
        return Err(ApiError::BadRequest("uri is required".to_string()));
    }
    Ok(Json(state.vaccine_proofs().get_asset(&query.uri).await))
}

/// Build vaccine proof routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/vaccine-proof/{hdid}/generate", post(generate_proof))
        .route("/api/vaccine-proof/{hdid}/mail", post(mail_proof))
        .route("/api/vaccine-proof/asset", get(get_asset))
}
