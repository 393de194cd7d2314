//! Patient data routes (Patient read).
//!
//! - GET /api/patient-data/{hdid}?types=A,B - Patient data of the given types
//! - GET /api/patient-data/{hdid}/file/{file_id} - A patient document

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use gateway_core::health::{PatientDataResponse, PatientDataType};
use gateway_core::{FhirRequirement, FhirResource, Hdid};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Identity, require_fhir};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PatientDataQuery {
    /// Comma-separated [`PatientDataType`] names; every type when absent.
    pub types: Option<String>,
}

fn parse_types(types: Option<&str>) -> Result<Vec<PatientDataType>, ApiError> {
    let Some(types) = types.filter(|t| !t.trim().is_empty()) else {
        return Ok(vec![
            PatientDataType::OrganDonorRegistrationStatus,
            PatientDataType::DiagnosticImaging,
        ]);
    };
    types
        .split(',')
        .map(|t| t.trim().parse().map_err(ApiError::BadRequest))
        .collect()
}

async fn get_patient_data(
    State(state): State<AppState>,
    identity: Identity,
    Path(hdid): Path<Hdid>,
    Query(query): Query<PatientDataQuery>,
) -> ApiResult<Json<PatientDataResponse>> {
    require_fhir(&identity, FhirRequirement::read(FhirResource::Patient), &hdid)?;

    let types = parse_types(query.types.as_deref())?;
    let response = state.patient_data().query(&hdid, &types).await?;
    Ok(Json(response))
}

/// Responds with the raw document and its media type, 404 when absent.
async fn get_patient_file(
    State(state): State<AppState>,
    identity: Identity,
    Path((hdid, file_id)): Path<(Hdid, String)>,
) -> ApiResult<Response> {
    require_fhir(&identity, FhirRequirement::read(FhirResource::Patient), &hdid)?;

    let file = state
        .patient_data()
        .query_file(&hdid, &file_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Patient file {} not found", file_id)))?;

    Ok(([(header::CONTENT_TYPE, file.media_type)], file.content).into_response())
}

/// Build patient data routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/patient-data/{hdid}", get(get_patient_data))
        .route("/api/patient-data/{hdid}/file/{file_id}", get(get_patient_file))
}
