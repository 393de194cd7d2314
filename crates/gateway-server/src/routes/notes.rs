//! User note routes.
//!
//! - GET /api/notes/{hdid} - List the user's notes
//! - POST /api/notes/{hdid} - Create a note
//! - PUT /api/notes/{hdid} - Update a note
//! - DELETE /api/notes/{hdid} - Delete a note
//!
//! Reads need `Note` read access and changes need `Note` write access, as the
//! owner or through a system scope.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use gateway_core::{FhirRequirement, FhirResource, Hdid, RequestResult, UserNote};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Identity, require_fhir};
use crate::services::note::DEFAULT_PAGE_SIZE;
use crate::state::AppState;

/// Query parameters for GET /api/notes/{hdid}.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesQuery {
    #[serde(default)]
    pub page: i64,
    pub page_size: Option<i64>,
}

/// The note in the body must belong to the route's patient.
fn check_owner(hdid: &Hdid, note: &UserNote) -> Result<(), ApiError> {
    if &note.hd_id != hdid {
        return Err(ApiError::BadRequest(
            "Note hdId does not match the route".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/notes/{hdid}
///
/// # Response
///
/// - 200 OK: `RequestResult<UserNote[]>`
/// - 400 Bad Request: negative page, non-positive page size, or a page
///   whose offset does not fit in 64 bits
/// - 403 Forbidden: no read access to the patient's notes
/// - 500: the profile key could not be generated and stored
async fn get_notes(
    State(state): State<AppState>,
    identity: Identity,
    Path(hdid): Path<Hdid>,
    Query(query): Query<NotesQuery>,
) -> ApiResult<Json<RequestResult<Vec<UserNote>>>> {
    require_fhir(&identity, FhirRequirement::read(FhirResource::Note), &hdid)?;

    if query.page < 0 {
        return Err(ApiError::BadRequest("page must not be negative".to_string()));
    }
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size <= 0 {
        return Err(ApiError::BadRequest("pageSize must be positive".to_string()));
    }
    if query.page.checked_mul(page_size).is_none() {
        return Err(ApiError::BadRequest("page is out of range".to_string()));
    }

    let result = state.notes().get_notes(&hdid, query.page, page_size).await?;
    Ok(Json(result))
}

/// POST /api/notes/{hdid}
async fn create_note(
    State(state): State<AppState>,
    identity: Identity,
    Path(hdid): Path<Hdid>,
    Json(mut note): Json<UserNote>,
) -> ApiResult<Json<RequestResult<UserNote>>> {
    require_fhir(&identity, FhirRequirement::write(FhirResource::Note), &hdid)?;
    check_owner(&hdid, &note)?;

    if note.id.is_nil() {
        note.id = Uuid::new_v4();
    }
    let result = state.notes().create_note(&note).await;
    if result.is_success() {
        tracing::info!(note_id = %note.id, "Note created");
    }
    Ok(Json(result))
}

/// PUT /api/notes/{hdid}
async fn update_note(
    State(state): State<AppState>,
    identity: Identity,
    Path(hdid): Path<Hdid>,
    Json(note): Json<UserNote>,
) -> ApiResult<Json<RequestResult<UserNote>>> {
    require_fhir(&identity, FhirRequirement::write(FhirResource::Note), &hdid)?;
    check_owner(&hdid, &note)?;

    Ok(Json(state.notes().update_note(&note).await))
}

/// DELETE /api/notes/{hdid}
async fn delete_note(
    State(state): State<AppState>,
    identity: Identity,
    Path(hdid): Path<Hdid>,
    Json(note): Json<UserNote>,
) -> ApiResult<Json<RequestResult<UserNote>>> {
    require_fhir(&identity, FhirRequirement::write(FhirResource::Note), &hdid)?;
    check_owner(&hdid, &note)?;

    let result = state.notes().delete_note(&note).await;
    if result.is_success() {
        tracing::info!(note_id = %note.id, "Note deleted");
    }
    Ok(Json(result))
}

/// Build note routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/notes/{hdid}",
        get(get_notes)
            .post(create_note)
            .put(update_note)
            .delete(delete_note),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_notes_query_defaults() {
        let query: NotesQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 0);
        assert!(query.page_size.is_none());

        let query: NotesQuery = serde_json::from_str(r#"{"page": 2, "pageSize": 10}"#).unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, Some(10));
    }

    #[test]
    fn test_check_owner() {
        let note = UserNote {
            id: Uuid::nil(),
            hd_id: Hdid::from("HDID-1"),
            title: None,
            text: None,
            journal_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            version: 0,
            created_date_time: chrono::Utc::now(),
            updated_date_time: chrono::Utc::now(),
        };
        assert!(check_owner(&Hdid::from("HDID-1"), &note).is_ok());
        assert!(matches!(
            check_owner(&Hdid::from("HDID-2"), &note),
            Err(ApiError::BadRequest(_))
        ));
    }
}
