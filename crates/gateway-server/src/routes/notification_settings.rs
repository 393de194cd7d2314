//! PUT /api/notification-settings/{hdid} - Push notification preferences to
//! PHSA (Patient write).
//!
//! The caller's bearer token is forwarded so PHSA acts on their behalf.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::put,
};
use gateway_core::health::{NotificationSettingsRequest, NotificationSettingsResponse};
use gateway_core::{FhirRequirement, FhirResource, Hdid, RequestResult};

use crate::error::ApiResult;
use crate::extract::{Identity, require_fhir};
use crate::state::AppState;

async fn set_notification_settings(
    State(state): State<AppState>,
    identity: Identity,
    Path(hdid): Path<Hdid>,
    Json(settings): Json<NotificationSettingsRequest>,
) -> ApiResult<Json<RequestResult<NotificationSettingsResponse>>> {
    require_fhir(&identity, FhirRequirement::write(FhirResource::Patient), &hdid)?;

    let result = state
        .notification_settings()
        .set_notification_settings(&hdid, &settings, identity.bearer_token())
        .await;
    Ok(Json(result))
}

/// Build notification settings routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/notification-settings/{hdid}",
        put(set_notification_settings),
    )
}
