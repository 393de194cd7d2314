//! Communication routes.
//!
//! - GET /api/communications/active - The banner to show now (public)
//! - GET /api/admin/communications - All communications
//! - POST /api/admin/communications - Add a communication
//! - PUT /api/admin/communications - Update a communication
//! - DELETE /api/admin/communications/{id} - Delete a communication
//!
//! Admin routes need the `AdminUser` role.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use gateway_core::{Communication, IdentityAccessRole, RequestResult};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Identity, require_role};
use crate::state::AppState;

/// GET /api/communications/active
async fn get_active_banner(State(state): State<AppState>) -> Json<RequestResult<Communication>> {
    Json(state.communications().get_active_banner().await)
}

/// GET /api/admin/communications
async fn list_communications(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<RequestResult<Vec<Communication>>>> {
    require_role(&identity, IdentityAccessRole::AdminUser)?;
    Ok(Json(state.communications().get_all().await))
}

/// POST /api/admin/communications
async fn add_communication(
    State(state): State<AppState>,
    identity: Identity,
    Json(mut communication): Json<Communication>,
) -> ApiResult<Json<RequestResult<Communication>>> {
    require_role(&identity, IdentityAccessRole::AdminUser)?;

    if communication.id.is_nil() {
        communication.id = Uuid::new_v4();
    }
    let result = state.communications().add(&communication).await;
    if result.is_success() {
        tracing::info!(
            communication_id = %communication.id,
            communication_type = communication.communication_type.as_str(),
            "Communication added"
        );
    }
    Ok(Json(result))
}

/// PUT /api/admin/communications
async fn update_communication(
    State(state): State<AppState>,
    identity: Identity,
    Json(communication): Json<Communication>,
) -> ApiResult<Json<RequestResult<Communication>>> {
    require_role(&identity, IdentityAccessRole::AdminUser)?;
    Ok(Json(state.communications().update(&communication).await))
}

/// DELETE /api/admin/communications/{id}
async fn delete_communication(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RequestResult<Communication>>> {
    require_role(&identity, IdentityAccessRole::AdminUser)?;
    Ok(Json(state.communications().delete(id).await))
}

/// Build communication routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/communications/active", get(get_active_banner))
        .route(
            "/api/admin/communications",
            get(list_communications)
                .post(add_communication)
                .put(update_communication),
        )
        .route("/api/admin/communications/{id}", delete(delete_communication))
}
