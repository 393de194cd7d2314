//! Services between the route handlers and the delegates.
//!
//! Services translate delegate outcomes into a [`gateway_core::RequestResult`].
//! Only violated invariants ([`DatabaseError`]) and agent access failures are
//! returned as Rust errors.

pub mod agent_access;
pub mod communication;
pub mod feedback;
pub mod immunization;
pub mod laboratory;
pub mod note;
pub mod notification_settings;
pub mod patient_data;
pub mod report;
pub mod vaccine_proof;

pub use agent_access::{AgentAccessError, AgentAccessService};
pub use communication::CommunicationService;
pub use feedback::UserFeedbackService;
pub use immunization::ImmunizationService;
pub use laboratory::LaboratoryService;
pub use note::NoteService;
pub use notification_settings::NotificationSettingsService;
pub use patient_data::PatientDataService;
pub use report::ReportService;
pub use vaccine_proof::VaccineProofService;

/// A database write that must succeed did not.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DatabaseError {
    message: String,
}

impl DatabaseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
