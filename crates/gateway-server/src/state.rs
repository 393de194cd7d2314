//! Application state shared across handlers.

use std::sync::Arc;

use gateway_core::{AesCryptoDelegate, CryptoDelegate};
use gateway_store::{
    CommunicationDelegate, DataAccessDelegate, FeedbackDelegate, InMemoryStore, NoteDelegate,
    RatingDelegate, Store, UserProfileDelegate,
};
use reqwest::Client;

use crate::config::ServerConfig;
use crate::delegates::mock::{
    MockCdogsDelegate, MockImmunizationDelegate, MockKeycloakAdminDelegate,
    MockLaboratoryDelegate, MockNotificationSettingsDelegate, MockPatientRepository,
    MockVaccineProofDelegate,
};
use crate::delegates::{
    CdogsDelegate, ImmunizationDelegate, KeycloakAdminDelegate, LaboratoryDelegate,
    NotificationSettingsDelegate, PatientRepository, RestCdogsDelegate, RestImmunizationDelegate,
    RestKeycloakAdminDelegate, RestLaboratoryDelegate, RestNotificationSettingsDelegate,
    RestPatientRepository, RestVaccineProofDelegate, VaccineProofDelegate,
};
use crate::services::{
    AgentAccessService, CommunicationService, ImmunizationService, LaboratoryService, NoteService,
    NotificationSettingsService, PatientDataService, ReportService, UserFeedbackService,
    VaccineProofService,
};

/// Every delegate the services are built from.
#[derive(Clone)]
pub struct Delegates {
    pub notes: Arc<dyn NoteDelegate>,
    pub profiles: Arc<dyn UserProfileDelegate>,
    pub data_access: Arc<dyn DataAccessDelegate>,
    pub ratings: Arc<dyn RatingDelegate>,
    pub feedback: Arc<dyn FeedbackDelegate>,
    pub communications: Arc<dyn CommunicationDelegate>,
    pub crypto: Arc<dyn CryptoDelegate>,
    pub immunizations: Arc<dyn ImmunizationDelegate>,
    pub patients: Arc<dyn PatientRepository>,
    pub vaccine_proofs: Arc<dyn VaccineProofDelegate>,
    pub cdogs: Arc<dyn CdogsDelegate>,
    pub keycloak: Arc<dyn KeycloakAdminDelegate>,
    pub notification_settings: Arc<dyn NotificationSettingsDelegate>,
    pub laboratory: Arc<dyn LaboratoryDelegate>,
}

impl Delegates {
    /// Postgres for storage and the configured REST services for everything else.
    pub fn rest(store: Store, client: Client, config: &ServerConfig) -> Self {
        let store = Arc::new(store);
        Self {
            notes: store.clone(),
            profiles: store.clone(),
            data_access: store.clone(),
            ratings: store.clone(),
            feedback: store.clone(),
            communications: store,
            crypto: Arc::new(AesCryptoDelegate),
            immunizations: Arc::new(RestImmunizationDelegate::new(
                client.clone(),
                &config.phsa_base_url,
            )),
            patients: Arc::new(RestPatientRepository::new(client.clone(), &config.phsa_base_url)),
            vaccine_proofs: Arc::new(RestVaccineProofDelegate::new(
                client.clone(),
                config.bcmp.clone(),
            )),
            cdogs: Arc::new(RestCdogsDelegate::new(client.clone(), &config.cdogs_base_url)),
            keycloak: Arc::new(RestKeycloakAdminDelegate::new(
                client.clone(),
                config.keycloak.clone(),
            )),
            notification_settings: Arc::new(RestNotificationSettingsDelegate::new(
                client.clone(),
                &config.phsa_base_url,
            )),
            laboratory: Arc::new(RestLaboratoryDelegate::new(client, &config.phsa_base_url)),
        }
    }

    /// `store` for storage and mocks for every external service.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            notes: store.clone(),
            profiles: store.clone(),
            data_access: store.clone(),
            ratings: store.clone(),
            feedback: store.clone(),
            communications: store,
            crypto: Arc::new(AesCryptoDelegate),
            immunizations: Arc::new(MockImmunizationDelegate::new()),
            patients: Arc::new(MockPatientRepository::new()),
            vaccine_proofs: Arc::new(MockVaccineProofDelegate::new()),
            cdogs: Arc::new(MockCdogsDelegate::default()),
            keycloak: Arc::new(MockKeycloakAdminDelegate::new()),
            notification_settings: Arc::new(MockNotificationSettingsDelegate::new()),
            laboratory: Arc::new(MockLaboratoryDelegate::new()),
        }
    }
}

/// Application state shared across all handlers.
///
/// This is cloneable and can be extracted in handlers using `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    notes: NoteService,
    feedback: UserFeedbackService,
    communications: CommunicationService,
    immunizations: ImmunizationService,
    patient_data: PatientDataService,
    reports: ReportService,
    vaccine_proofs: VaccineProofService,
    notification_settings: NotificationSettingsService,
    laboratory: LaboratoryService,
    agents: AgentAccessService,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ServerConfig, delegates: Delegates) -> Self {
        Self {
            notes: NoteService::new(
                delegates.notes,
                delegates.profiles,
                delegates.data_access,
                delegates.crypto,
            ),
            feedback: UserFeedbackService::new(delegates.ratings, delegates.feedback),
            communications: CommunicationService::new(delegates.communications),
            immunizations: ImmunizationService::new(delegates.immunizations),
            patient_data: PatientDataService::new(delegates.patients),
            reports: ReportService::new(delegates.cdogs, config.report_template_dir.clone()),
            vaccine_proofs: VaccineProofService::new(delegates.vaccine_proofs),
            notification_settings: NotificationSettingsService::new(
                delegates.notification_settings,
            ),
            laboratory: LaboratoryService::new(delegates.laboratory),
            agents: AgentAccessService::new(delegates.keycloak),
            config: Arc::new(config),
        }
    }

    /// Get a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn notes(&self) -> &NoteService {
        &self.notes
    }

    pub fn feedback(&self) -> &UserFeedbackService {
        &self.feedback
    }

    pub fn communications(&self) -> &CommunicationService {
        &self.communications
    }

    pub fn immunizations(&self) -> &ImmunizationService {
        &self.immunizations
    }

    pub fn patient_data(&self) -> &PatientDataService {
        &self.patient_data
    }

    pub fn reports(&self) -> &ReportService {
        &self.reports
    }

    pub fn vaccine_proofs(&self) -> &VaccineProofService {
        &self.vaccine_proofs
    }

    pub fn notification_settings(&self) -> &NotificationSettingsService {
        &self.notification_settings
    }

    pub fn laboratory(&self) -> &LaboratoryService {
        &self.laboratory
    }

    pub fn agents(&self) -> &AgentAccessService {
        &self.agents
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
