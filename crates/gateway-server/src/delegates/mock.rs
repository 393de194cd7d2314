//! In-process delegates for tests.
//!
//! Each mock answers from state set up by the test and records what it was
//! asked, without making network calls.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use gateway_core::health::{
    Address, CdogsRequest, ImmunizationResponse, NotificationSettingsRequest,
    NotificationSettingsResponse, PatientData, PatientDataType, PatientFile, PhsaResult,
    PublicCovidTestQuery, PublicCovidTestResponse, ReportModel, VaccineProofRequest,
    VaccineProofResponse, VaccineProofTemplate,
};
use gateway_core::{Hdid, IdentityAccessRole, RequestResult};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::keycloak::{RoleRepresentation, UserRepresentation};
use super::{
    CdogsDelegate, ImmunizationDelegate, KeycloakAdminDelegate, LaboratoryDelegate,
    NotificationSettingsDelegate, PatientRepository, UpstreamError, VaccineProofDelegate,
};

fn mock_failure() -> UpstreamError {
    UpstreamError::Status(503)
}

// ============================================================================
// Immunizations
// ============================================================================

/// Answers every immunization request with a preset result.
#[derive(Debug)]
pub struct MockImmunizationDelegate {
    response: RwLock<RequestResult<PhsaResult<Vec<ImmunizationResponse>>>>,
}

impl Default for MockImmunizationDelegate {
    fn default() -> Self {
        Self {
            response: RwLock::new(RequestResult::success_page(
                PhsaResult {
                    load_state: Default::default(),
                    result: Some(Vec::new()),
                },
                0,
                0,
                0,
            )),
        }
    }
}

impl MockImmunizationDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_response(&self, response: RequestResult<PhsaResult<Vec<ImmunizationResponse>>>) {
        *self.response.write().await = response;
    }
}

#[async_trait]
impl ImmunizationDelegate for MockImmunizationDelegate {
    async fn get_immunizations(
        &self,
        _hdid: &Hdid,
        _page_index: i64,
    ) -> RequestResult<PhsaResult<Vec<ImmunizationResponse>>> {
        self.response.read().await.clone()
    }
}

// ============================================================================
// Vaccine Proofs
// ============================================================================

/// A proof request received by [`MockVaccineProofDelegate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedProofRequest {
    pub template: VaccineProofTemplate,
    pub request: VaccineProofRequest,
    /// Present for mailed proofs.
    pub address: Option<Address>,
}

/// Answers proof requests with preset results.
#[derive(Debug)]
pub struct MockVaccineProofDelegate {
    response: RwLock<RequestResult<VaccineProofResponse>>,
    asset: RwLock<RequestResult<ReportModel>>,
    requests: RwLock<Vec<RecordedProofRequest>>,
}

impl Default for MockVaccineProofDelegate {
    fn default() -> Self {
        Self {
            response: RwLock::new(RequestResult::success(VaccineProofResponse::default())),
            asset: RwLock::new(RequestResult::default()),
            requests: RwLock::new(Vec::new()),
        }
    }
}

impl MockVaccineProofDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_response(&self, response: RequestResult<VaccineProofResponse>) {
        *self.response.write().await = response;
    }

    pub async fn set_asset(&self, asset: RequestResult<ReportModel>) {
        *self.asset.write().await = asset;
    }

    pub async fn requests(&self) -> Vec<RecordedProofRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl VaccineProofDelegate for MockVaccineProofDelegate {
    async fn mail(
        &self,
        template: VaccineProofTemplate,
        request: &VaccineProofRequest,
        address: &Address,
    ) -> RequestResult<VaccineProofResponse> {
        self.requests.write().await.push(RecordedProofRequest {
            template,
            request: request.clone(),
            address: Some(address.clone()),
        });
        self.response.read().await.clone()
    }

    async fn generate(
        &self,
        template: VaccineProofTemplate,
        request: &VaccineProofRequest,
    ) -> RequestResult<VaccineProofResponse> {
        self.requests.write().await.push(RecordedProofRequest {
            template,
            request: request.clone(),
            address: None,
        });
        self.response.read().await.clone()
    }

    async fn get_asset(&self, _asset_uri: &str) -> RequestResult<ReportModel> {
        self.asset.read().await.clone()
    }
}

// ============================================================================
// Patient Data
// ============================================================================

/// Patient records held in memory.
#[derive(Debug, Default)]
pub struct MockPatientRepository {
    pids: RwLock<HashMap<Hdid, Uuid>>,
    data: RwLock<HashMap<Uuid, Vec<PatientData>>>,
    files: RwLock<HashMap<(Uuid, String), PatientFile>>,
    should_fail: RwLock<bool>,
    fail_role_grants: RwLock<bool>,
}

impl MockPatientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a personal account and return its PID.
    pub async fn add_patient(&self, hdid: &Hdid) -> Uuid {
        let pid = Uuid::new_v4();
        self.pids.write().await.insert(hdid.clone(), pid);
        pid
    }

    pub async fn add_data(&self, pid: Uuid, item: PatientData) {
        self.data.write().await.entry(pid).or_default().push(item);
    }

    pub async fn add_file(&self, pid: Uuid, file: PatientFile) {
        self.files
            .write()
            .await
            .insert((pid, file.file_id.clone()), file);
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }

    /// Make only role grants fail, leaving every other call working.
    pub async fn set_fail_role_grants(&self, fail: bool) {
        *self.fail_role_grants.write().await = fail;
    }

    async fn check(&self) -> Result<(), UpstreamError> {
        if *self.should_fail.read().await {
            return Err(mock_failure());
        }
        Ok(())
    }
}

fn data_type(item: &PatientData) -> PatientDataType {
    match item {
        PatientData::OrganDonorRegistration(_) => PatientDataType::OrganDonorRegistrationStatus,
        PatientData::DiagnosticImagingExam(_) => PatientDataType::DiagnosticImaging,
    }
}

#[async_trait]
impl PatientRepository for MockPatientRepository {
    async fn get_pid(&self, hdid: &Hdid) -> Result<Option<Uuid>, UpstreamError> {
        self.check().await?;
        Ok(self.pids.read().await.get(hdid).copied())
    }

    async fn query(
        &self,
        pid: Uuid,
        types: &[PatientDataType],
    ) -> Result<Vec<PatientData>, UpstreamError> {
        self.check().await?;
        Ok(self
            .data
            .read()
            .await
            .get(&pid)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| types.contains(&data_type(item)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_file(&self, pid: Uuid, file_id: &str) -> Result<Option<PatientFile>, UpstreamError> {
        self.check().await?;
        Ok(self
            .files
            .read()
            .await
            .get(&(pid, file_id.to_string()))
            .cloned())
    }
}

// ============================================================================
// Notification Settings
// ============================================================================

/// Notification settings update received by [`MockNotificationSettingsDelegate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSettings {
    pub hdid: Hdid,
    pub settings: NotificationSettingsRequest,
    pub bearer_token: String,
}

#[derive(Debug)]
pub struct MockNotificationSettingsDelegate {
    response: RwLock<Option<RequestResult<NotificationSettingsResponse>>>,
    received: RwLock<Vec<RecordedSettings>>,
}

impl Default for MockNotificationSettingsDelegate {
    fn default() -> Self {
        Self {
            response: RwLock::new(None),
            received: RwLock::new(Vec::new()),
        }
    }
}

impl MockNotificationSettingsDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer with `response` instead of echoing the request.
    pub async fn set_response(&self, response: RequestResult<NotificationSettingsResponse>) {
        *self.response.write().await = Some(response);
    }

    pub async fn received(&self) -> Vec<RecordedSettings> {
        self.received.read().await.clone()
    }
}

#[async_trait]
impl NotificationSettingsDelegate for MockNotificationSettingsDelegate {
    async fn set_notification_settings(
        &self,
        hdid: &Hdid,
        settings: &NotificationSettingsRequest,
        bearer_token: &str,
    ) -> RequestResult<NotificationSettingsResponse> {
        self.received.write().await.push(RecordedSettings {
            hdid: hdid.clone(),
            settings: settings.clone(),
            bearer_token: bearer_token.to_string(),
        });

        if let Some(response) = &*self.response.read().await {
            return response.clone();
        }
        RequestResult::success(NotificationSettingsResponse {
            email_enabled: settings.email_enabled,
            email_address: settings.email_address.clone(),
            sms_enabled: settings.sms_enabled,
            sms_number: settings.sms_number.clone(),
            sms_verified: settings.sms_verified,
        })
    }
}

// ============================================================================
// Laboratory
// ============================================================================

#[derive(Debug)]
pub struct MockLaboratoryDelegate {
    response: RwLock<RequestResult<PublicCovidTestResponse>>,
}

impl Default for MockLaboratoryDelegate {
    fn default() -> Self {
        Self {
            response: RwLock::new(RequestResult::success(PublicCovidTestResponse {
                loaded: true,
                ..Default::default()
            })),
        }
    }
}

impl MockLaboratoryDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_response(&self, response: RequestResult<PublicCovidTestResponse>) {
        *self.response.write().await = response;
    }
}

#[async_trait]
impl LaboratoryDelegate for MockLaboratoryDelegate {
    async fn get_public_test_results(
        &self,
        _query: &PublicCovidTestQuery,
    ) -> RequestResult<PublicCovidTestResponse> {
        self.response.read().await.clone()
    }
}

// ============================================================================
// CDOGS
// ============================================================================

/// Renders every request to a fixed document.
#[derive(Debug)]
pub struct MockCdogsDelegate {
    document: Vec<u8>,
    requests: RwLock<Vec<CdogsRequest>>,
    should_fail: RwLock<bool>,
}

impl Default for MockCdogsDelegate {
    fn default() -> Self {
        Self::new(b"%PDF-mock".to_vec())
    }
}

impl MockCdogsDelegate {
    pub fn new(document: Vec<u8>) -> Self {
        Self {
            document,
            requests: RwLock::new(Vec::new()),
            should_fail: RwLock::new(false),
        }
    }

    pub async fn requests(&self) -> Vec<CdogsRequest> {
        self.requests.read().await.clone()
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }
}

#[async_trait]
impl CdogsDelegate for MockCdogsDelegate {
    async fn render(&self, request: &CdogsRequest) -> Result<Vec<u8>, UpstreamError> {
        if *self.should_fail.read().await {
            return Err(mock_failure());
        }
        self.requests.write().await.push(request.clone());
        Ok(self.document.clone())
    }
}

// ============================================================================
// Keycloak
// ============================================================================

/// A Keycloak realm held in memory.
#[derive(Debug)]
pub struct MockKeycloakAdminDelegate {
    users: RwLock<HashMap<Uuid, (UserRepresentation, BTreeSet<String>)>>,
    realm_roles: Vec<RoleRepresentation>,
    should_fail: RwLock<bool>,
    fail_role_grants: RwLock<bool>,
}

impl Default for MockKeycloakAdminDelegate {
    fn default() -> Self {
        let realm_roles = IdentityAccessRole::all()
            .iter()
            .map(|role| role.as_str())
            .chain(["offline_access"])
            .map(|name| RoleRepresentation {
                id: Some(Uuid::new_v4().to_string()),
                name: name.to_string(),
            })
            .collect();

        Self {
            users: RwLock::new(HashMap::new()),
            realm_roles,
            should_fail: RwLock::new(false),
            fail_role_grants: RwLock::new(false),
        }
    }
}

impl MockKeycloakAdminDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user with realm roles and return its id.
    pub async fn add_user(&self, username: &str, roles: &[&str]) -> Uuid {
        let id = Uuid::new_v4();
        let user = UserRepresentation {
            id: Some(id),
            username: username.to_string(),
            enabled: true,
        };
        let roles = roles.iter().map(|r| r.to_string()).collect();
        self.users.write().await.insert(id, (user, roles));
        id
    }

    /// Realm role names of a user, `None` when the user does not exist.
    pub async fn user_roles(&self, id: Uuid) -> Option<BTreeSet<String>> {
        self.users.read().await.get(&id).map(|(_, roles)| roles.clone())
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }

    /// Make only role grants fail, leaving every other call working.
    pub async fn set_fail_role_grants(&self, fail: bool) {
        *self.fail_role_grants.write().await = fail;
    }

    async fn check(&self) -> Result<(), UpstreamError> {
        if *self.should_fail.read().await {
            return Err(mock_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl KeycloakAdminDelegate for MockKeycloakAdminDelegate {
    async fn search_users(&self, search: &str) -> Result<Vec<UserRepresentation>, UpstreamError> {
        self.check().await?;
        let search = search.to_lowercase();
        let mut users: Vec<UserRepresentation> = self
            .users
            .read()
            .await
            .values()
            .filter(|(user, _)| user.username.to_lowercase().contains(&search))
            .map(|(user, _)| user.clone())
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn find_user(&self, username: &str) -> Result<Option<UserRepresentation>, UpstreamError> {
        self.check().await?;
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|(user, _)| user.username == username)
            .map(|(user, _)| user.clone()))
    }

    async fn create_user(&self, user: &UserRepresentation) -> Result<(), UpstreamError> {
        self.check().await?;
        let mut users = self.users.write().await;
        if users.values().any(|(u, _)| u.username == user.username) {
            return Err(UpstreamError::Status(409));
        }
        let id = Uuid::new_v4();
        let stored = UserRepresentation {
            id: Some(id),
            ..user.clone()
        };
        users.insert(id, (stored, BTreeSet::new()));
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), UpstreamError> {
        self.check().await?;
        match self.users.write().await.remove(&user_id) {
            Some(_) => Ok(()),
            None => Err(UpstreamError::Status(404)),
        }
    }

    async fn get_realm_roles(&self) -> Result<Vec<RoleRepresentation>, UpstreamError> {
        self.check().await?;
        Ok(self.realm_roles.clone())
    }

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<RoleRepresentation>, UpstreamError> {
        self.check().await?;
        let users = self.users.read().await;
        let (_, roles) = users.get(&user_id).ok_or(UpstreamError::Status(404))?;
        Ok(roles
            .iter()
            .map(|name| RoleRepresentation {
                id: None,
                name: name.clone(),
            })
            .collect())
    }

    async fn add_user_roles(
        &self,
        user_id: Uuid,
        roles: &[RoleRepresentation],
    ) -> Result<(), UpstreamError> {
        self.check().await?;
        if *self.fail_role_grants.read().await {
            return Err(mock_failure());
        }
        let mut users = self.users.write().await;
        let (_, current) = users.get_mut(&user_id).ok_or(UpstreamError::Status(404))?;
        current.extend(roles.iter().map(|r| r.name.clone()));
        Ok(())
    }

    async fn remove_user_roles(
        &self,
        user_id: Uuid,
        roles: &[RoleRepresentation],
    ) -> Result<(), UpstreamError> {
        self.check().await?;
        let mut users = self.users.write().await;
        let (_, current) = users.get_mut(&user_id).ok_or(UpstreamError::Status(404))?;
        for role in roles {
            current.remove(&role.name);
        }
        Ok(())
    }
}
