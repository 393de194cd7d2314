//! Feedback and rating routes.
//!
//! - POST /api/feedback/{hdid} - Submit user feedback (Patient write)
//! - POST /api/ratings - Submit an anonymous rating

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use gateway_core::{FhirRequirement, FhirResource, Hdid, Rating, RequestResult, UserFeedback};
use gateway_store::DbStatusCode;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Identity, require_fhir};
use crate::state::AppState;

/// POST /api/feedback/{hdid}
///
/// # Response
///
/// - 201 Created: the stored feedback
/// - 403 Forbidden: no write access to the patient
/// - 409 Conflict: the feedback was not stored
async fn create_feedback(
    State(state): State<AppState>,
    identity: Identity,
    Path(hdid): Path<Hdid>,
    Json(mut feedback): Json<UserFeedback>,
) -> ApiResult<(StatusCode, Json<UserFeedback>)> {
    require_fhir(&identity, FhirRequirement::write(FhirResource::Patient), &hdid)?;

    if feedback.id.is_nil() {
        feedback.id = Uuid::new_v4();
    }
    feedback.user_profile_id = Some(hdid);

    let result = state.feedback().create_user_feedback(&feedback).await;
    match result.payload {
        Some(stored) if result.status == DbStatusCode::Created => {
            tracing::info!(feedback_id = %stored.id, "User feedback stored");
            Ok((StatusCode::CREATED, Json(stored)))
        }
        _ => Err(ApiError::Conflict(result.message)),
    }
}

/// POST /api/ratings
///
/// Ratings are anonymous and need no authentication.
async fn create_rating(
    State(state): State<AppState>,
    Json(mut rating): Json<Rating>,
) -> ApiResult<Json<RequestResult<Rating>>> {
    if !rating.is_valid() {
        return Err(ApiError::BadRequest(format!(
            "ratingValue must be between 1 and 5, got {}",
            rating.rating_value
        )));
    }
    if rating.id.is_nil() {
        rating.id = Uuid::new_v4();
    }

    Ok(Json(state.feedback().create_rating(&rating).await))
}

/// Build feedback routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/feedback/{hdid}", post(create_feedback))
        .route("/api/ratings", post(create_rating))
}
