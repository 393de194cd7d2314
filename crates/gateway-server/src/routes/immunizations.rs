//! GET /api/immunizations/{hdid} - A patient's immunizations (Immunization read).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use gateway_core::health::ImmunizationResult;
use gateway_core::{FhirRequirement, FhirResource, Hdid, RequestResult};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extract::{Identity, require_fhir};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmunizationQuery {
    #[serde(default)]
    pub page_index: i64,
}

async fn get_immunizations(
    State(state): State<AppState>,
    identity: Identity,
    Path(hdid): Path<Hdid>,
    Query(query): Query<ImmunizationQuery>,
) -> ApiResult<Json<RequestResult<ImmunizationResult>>> {
    require_fhir(
        &identity,
        FhirRequirement::read(FhirResource::Immunization),
        &hdid,
    )?;

    let result = state
        .immunizations()
        .get_immunizations(&hdid, query.page_index.max(0))
        .await;
    Ok(Json(result))
}

/// Build immunization routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/immunizations/{hdid}", get(get_immunizations))
}
