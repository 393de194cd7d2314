//! POST /api/reports - Render a report through CDOGS (any authenticated caller).

use axum::{Json, Router, extract::State, routing::post};
use gateway_core::RequestResult;
use gateway_core::health::{ReportModel, ReportRequest};

use crate::error::ApiResult;
use crate::extract::Identity;
use crate::state::AppState;

async fn generate_report(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<ReportRequest>,
) -> ApiResult<Json<RequestResult<ReportModel>>> {
    tracing::info!(
        subject = %identity.principal.subject,
        template = request.template.name(),
        format = request.format.extension(),
        "Generating report"
    );
    Ok(Json(state.reports().get_report(&request).await))
}

/// Build report routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/reports", post(generate_report))
}
