//! Agent access routes (role `AdminUser`).
//!
//! - GET /api/admin/agents?query= - Agents matching the query
//! - POST /api/admin/agents - Provision an agent
//! - PUT /api/admin/agents - Update an agent's roles
//! - DELETE /api/admin/agents/{id} - Remove an agent
//!
//! Keycloak failures are reported as 502.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use gateway_core::{AdminAgent, IdentityAccessRole};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Identity, require_role};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AgentQuery {
    #[serde(default)]
    pub query: String,
}

async fn get_agents(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<AgentQuery>,
) -> ApiResult<Json<Vec<AdminAgent>>> {
    require_role(&identity, IdentityAccessRole::AdminUser)?;

    if query.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query is required".to_string()));
    }
    Ok(Json(state.agents().get_agents(query.query.trim()).await?))
}

async fn provision_agent(
    State(state): State<AppState>,
    identity: Identity,
    Json(agent): Json<AdminAgent>,
) -> ApiResult<Json<AdminAgent>> {
    require_role(&identity, IdentityAccessRole::AdminUser)?;
    Ok(Json(state.agents().provision_agent_access(&agent).await?))
}

async fn update_agent(
    State(state): State<AppState>,
    identity: Identity,
    Json(agent): Json<AdminAgent>,
) -> ApiResult<Json<AdminAgent>> {
    require_role(&identity, IdentityAccessRole::AdminUser)?;
    Ok(Json(state.agents().update_agent_access(&agent).await?))
}

async fn remove_agent(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&identity, IdentityAccessRole::AdminUser)?;
    state.agents().remove_agent_access(id).await?;
    Ok(StatusCode::OK)
}

/// Build agent access routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/agents",
            get(get_agents).post(provision_agent).put(update_agent),
        )
        .route("/api/admin/agents/{id}", delete(remove_agent))
}
