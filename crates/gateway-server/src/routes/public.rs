//! GET /api/public/covid-tests - Unauthenticated COVID-19 test lookup.
//!
//! Query: `phn`, `dateOfBirth`, `collectionDate` (YYYY-MM-DD).

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use gateway_core::RequestResult;
use gateway_core::health::{PublicCovidTestQuery, PublicCovidTestResponse};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

async fn get_covid_tests(
    State(state): State<AppState>,
    Query(query): Query<PublicCovidTestQuery>,
) -> ApiResult<Json<RequestResult<PublicCovidTestResponse>>> {
    let phn = query.phn.trim();
    if phn.len() != 10 || !phn.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::BadRequest(
            "phn must be a 10 digit personal health number".to_string(),
        ));
    }
    Ok(Json(state.laboratory().get_public_test_results(&query).await))
}

/// Build public routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/public/covid-tests", get(get_covid_tests))
}
