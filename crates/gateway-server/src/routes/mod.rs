//! Route definitions for the HTTP API.

pub mod agents;
pub mod communications;
pub mod feedback;
pub mod health;
pub mod immunizations;
pub mod notes;
pub mod notification_settings;
pub mod patient_data;
pub mod public;
pub mod reports;
pub mod vaccine_proof;

use axum::Router;

use crate::state::AppState;

/// Build the complete router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(notes::routes())
        .merge(feedback::routes())
        .merge(communications::routes())
        .merge(immunizations::routes())
        .merge(patient_data::routes())
        .merge(reports::routes())
        .merge(vaccine_proof::routes())
        .merge(notification_settings::routes())
        .merge(agents::routes())
        .merge(public::routes())
        .with_state(state)
}
