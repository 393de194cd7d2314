//! PHSA patient data repository: personal accounts, health options,
//! health data and patient files.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::NaiveDate;
use gateway_core::Hdid;
use gateway_core::health::{
    DiagnosticImagingExam, DonorStatus, OrganDonorRegistration, PatientData, PatientDataType,
    PatientFile,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use super::{UpstreamError, read_json};
use crate::http::segment_url;

/// Access to patient records held by PHSA.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Resolve the PHSA patient identifier for `hdid`. `None` when the
    /// patient has no personal account.
    async fn get_pid(&self, hdid: &Hdid) -> Result<Option<Uuid>, UpstreamError>;

    /// Patient data of the requested types.
    async fn query(
        &self,
        pid: Uuid,
        types: &[PatientDataType],
    ) -> Result<Vec<PatientData>, UpstreamError>;

    /// A patient file. `None` when it does not exist or has no content.
    async fn get_file(&self, pid: Uuid, file_id: &str) -> Result<Option<PatientFile>, UpstreamError>;
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonalAccount {
    patient_identity: PatientIdentity,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatientIdentity {
    pid: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct HealthResult<T> {
    #[serde(default)]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthOption {
    donor_status: DonorStatus,
    status_message: Option<String>,
    health_options_file_id: Option<String>,
}

impl From<HealthOption> for OrganDonorRegistration {
    fn from(option: HealthOption) -> Self {
        Self {
            status: option.donor_status,
            status_message: option.status_message,
            registration_file_id: option.health_options_file_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthDataExam {
    body_part: Option<String>,
    exam_date: Option<String>,
    health_data_file_id: Option<String>,
    health_authority: Option<String>,
    modality: Option<String>,
    organization: Option<String>,
    procedure_description: Option<String>,
    status: Option<String>,
}

impl From<HealthDataExam> for DiagnosticImagingExam {
    fn from(exam: HealthDataExam) -> Self {
        Self {
            body_part: exam.body_part,
            exam_date: exam.exam_date.as_deref().and_then(parse_exam_date),
            file_id: exam.health_data_file_id,
            health_authority: exam.health_authority,
            modality: exam.modality,
            organization: exam.organization,
            procedure_description: exam.procedure_description,
            status: exam.status,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResult {
    media_type: Option<String>,
    data: Option<String>,
}

/// Date part of a PHSA timestamp (`2020-01-01`, `2020-01-01T00:00:00`, ...).
fn parse_exam_date(value: &str) -> Option<NaiveDate> {
    let date = value.get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

// ============================================================================
// REST Implementation
// ============================================================================

/// [`PatientRepository`] over the PHSA REST API.
#[derive(Debug, Clone)]
pub struct RestPatientRepository {
    client: Client,
    base_url: String,
}

impl RestPatientRepository {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn health_options(&self, pid: Uuid) -> Result<Vec<PatientData>, UpstreamError> {
        let pid = pid.to_string();
        let url = segment_url(&self.base_url, &["patient", &pid, "health-options"])?;
        let response = self
            .client
            .get(url)
            .query(&[("categories", "BcTransplantOrganDonor")])
            .send()
            .await?;
        let result: HealthResult<HealthOption> = read_json(response).await?;

        Ok(result
            .data
            .into_iter()
            .map(|option| PatientData::OrganDonorRegistration(option.into()))
            .collect())
    }

    async fn health_data(&self, pid: Uuid) -> Result<Vec<PatientData>, UpstreamError> {
        let pid = pid.to_string();
        let url = segment_url(&self.base_url, &["patient", &pid, "health-data"])?;
        let response = self
            .client
            .get(url)
            .query(&[("categories", "DiagnosticImaging")])
            .send()
            .await?;
        let result: HealthResult<HealthDataExam> = read_json(response).await?;

        Ok(result
            .data
            .into_iter()
            .map(|exam| PatientData::DiagnosticImagingExam(exam.into()))
            .collect())
    }
}

#[async_trait]
impl PatientRepository for RestPatientRepository {
    async fn get_pid(&self, hdid: &Hdid) -> Result<Option<Uuid>, UpstreamError> {
        let url = segment_url(&self.base_url, &["personal-accounts", hdid.as_str()])?;
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("No personal account for patient");
            return Ok(None);
        }

        let account: PersonalAccount = read_json(response).await?;
        Ok(Some(account.patient_identity.pid))
    }

    async fn query(
        &self,
        pid: Uuid,
        types: &[PatientDataType],
    ) -> Result<Vec<PatientData>, UpstreamError> {
        let mut items = Vec::new();
        if types.contains(&PatientDataType::OrganDonorRegistrationStatus) {
            items.extend(self.health_options(pid).await?);
        }
        if types.contains(&PatientDataType::DiagnosticImaging) {
            items.extend(self.health_data(pid).await?);
        }
        tracing::debug!(pid = %pid, count = items.len(), "Queried patient data");
        Ok(items)
    }

    async fn get_file(&self, pid: Uuid, file_id: &str) -> Result<Option<PatientFile>, UpstreamError> {
        let pid = pid.to_string();
        let url = segment_url(&self.base_url, &["patient", &pid, "file", file_id])?;
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(file_id = %file_id, "Patient file not found");
            return Ok(None);
        }

        let file: Option<FileResult> = read_json(response).await?;
        let Some(FileResult {
            media_type: Some(media_type),
            data: Some(data),
        }) = file
        else {
            return Ok(None);
        };

        let content = BASE64
            .decode(data.as_bytes())
            .map_err(|e| UpstreamError::InvalidResponse(format!("file content: {}", e)))?;

        Ok(Some(PatientFile {
            file_id: file_id.to_string(),
            media_type,
            content,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_upstream, test_client};
    use axum::{Json, Router, extract::Path, http::StatusCode as AxumStatus, routing::get};
    use serde_json::json;

    async fn repository(router: Router) -> RestPatientRepository {
        RestPatientRepository::new(test_client(), spawn_upstream(router).await)
    }

    #[test]
    fn test_parse_exam_date() {
        let expected = NaiveDate::from_ymd_opt(2020, 1, 1);
        assert_eq!(parse_exam_date("2020-01-01T00:00:00"), expected);
        assert_eq!(parse_exam_date("2020-01-01"), expected);
        assert_eq!(parse_exam_date("garbage"), None);
    }

    #[tokio::test]
    async fn test_get_pid() {
        let pid = Uuid::new_v4();
        let router = Router::new()
            .route(
                "/personal-accounts/known",
                get(move || async move {
                    Json(json!({ "id": Uuid::new_v4(), "patientIdentity": { "pid": pid } }))
                }),
            )
            .route(
                "/personal-accounts/unknown",
                get(|| async { AxumStatus::NOT_FOUND }),
            );
        let repo = repository(router).await;

        assert_eq!(repo.get_pid(&Hdid::from("known")).await.unwrap(), Some(pid));
        assert_eq!(repo.get_pid(&Hdid::from("unknown")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_query_organ_donor() {
        let router = Router::new().route(
            "/patient/{pid}/health-options",
            get(|| async {
                Json(json!({
                    "metadata": {},
                    "data": [{
                        "donorStatus": "Registered",
                        "statusMessage": "statusmessage",
                        "healthOptionsFileId": "file-1",
                        "healthOptionsId": "optid"
                    }]
                }))
            }),
        );
        let repo = repository(router).await;

        let items = repo
            .query(Uuid::new_v4(), &[PatientDataType::OrganDonorRegistrationStatus])
            .await
            .unwrap();

        assert_eq!(
            items,
            vec![PatientData::OrganDonorRegistration(OrganDonorRegistration {
                status: DonorStatus::Registered,
                status_message: Some("statusmessage".into()),
                registration_file_id: Some("file-1".into()),
            })]
        );
    }

    #[tokio::test]
    async fn test_query_diagnostic_imaging() {
        let router = Router::new().route(
            "/patient/{pid}/health-data",
            get(|| async {
                Json(json!({
                    "data": [{
                        "bodyPart": "Some BodyPart",
                        "examDate": "2020-01-01T00:00:00",
                        "healthDataFileId": "Some FileId",
                        "healthAuthority": "Some HealthAuthority",
                        "modality": "Some Modality",
                        "organization": "Some Organization",
                        "procedureDescription": "Some ProcedureDescription",
                        "status": "Scheduled"
                    }]
                }))
            }),
        );
        let repo = repository(router).await;

        let items = repo
            .query(Uuid::new_v4(), &[PatientDataType::DiagnosticImaging])
            .await
            .unwrap();

        let [PatientData::DiagnosticImagingExam(exam)] = items.as_slice() else {
            panic!("expected one exam, got {:?}", items);
        };
        assert_eq!(exam.file_id.as_deref(), Some("Some FileId"));
        assert_eq!(exam.exam_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(exam.status.as_deref(), Some("Scheduled"));
    }

    #[tokio::test]
    async fn test_get_file_variants() {
        let router = Router::new()
            .route(
                "/patient/{pid}/file/present",
                get(|| async {
                    Json(json!({
                        "mediaType": "text/plain",
                        "data": BASE64.encode("somedata"),
                        "encoding": "base64"
                    }))
                }),
            )
            .route(
                "/patient/{pid}/file/empty",
                get(|| async { Json(json!({ "mediaType": null, "data": null })) }),
            )
            .route(
                "/patient/{pid}/file/null",
                get(|| async { Json(serde_json::Value::Null) }),
            )
            .route(
                "/patient/{pid}/file/missing",
                get(|| async { AxumStatus::NOT_FOUND }),
            );
        let repo = repository(router).await;
        let pid = Uuid::new_v4();

        let file = repo.get_file(pid, "present").await.unwrap().unwrap();
        assert_eq!(file.file_id, "present");
        assert_eq!(file.media_type, "text/plain");
        assert_eq!(file.content, b"somedata");

        assert!(repo.get_file(pid, "empty").await.unwrap().is_none());
        assert!(repo.get_file(pid, "null").await.unwrap().is_none());
        assert!(repo.get_file(pid, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_error() {
        let router = Router::new().route(
            "/patient/{pid}/health-data",
            get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
        );
        let repo = repository(router).await;

        let err = repo
            .query(Uuid::new_v4(), &[PatientDataType::DiagnosticImaging])
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Status(500)));
    }

    #[tokio::test]
    async fn test_query_without_data_is_empty() {
        let router = Router::new()
            .route(
                "/patient/{pid}/health-options",
                get(|| async { Json(json!({ "metadata": {} })) }),
            )
            .route(
                "/patient/{pid}/health-data",
                get(|| async { Json(json!({})) }),
            );
        let repo = repository(router).await;

        let items = repo
            .query(
                Uuid::new_v4(),
                &[PatientDataType::OrganDonorRegistrationStatus, PatientDataType::DiagnosticImaging],
            )
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_identifiers_stay_in_their_segment() {
        let pid = Uuid::new_v4();
        let router = Router::new()
            .route(
                "/personal-accounts/{hdid}",
                get(move |Path(hdid): Path<String>| async move {
                    assert_eq!(hdid, "a/b c");
                    Json(json!({ "patientIdentity": { "pid": pid } }))
                }),
            )
            .route(
                "/patient/{pid}/file/{file_id}",
                get(|Path((_, file_id)): Path<(String, String)>| async move {
                    assert_eq!(file_id, "../health-data?x=1");
                    Json(json!({ "mediaType": "text/plain", "data": BASE64.encode("x") }))
                }),
            )
            .route(
                "/patient/{pid}/health-data",
                get(|| async { AxumStatus::IM_A_TEAPOT }),
            );
        let repo = repository(router).await;

        assert_eq!(repo.get_pid(&Hdid::from("a/b c")).await.unwrap(), Some(pid));
        let file = repo.get_file(pid, "../health-data?x=1").await.unwrap().unwrap();
        assert_eq!(file.content, b"x");
    }
}
