//! Health record payloads exchanged with PHSA, BC Mail Plus and CDOGS.
//!
//! Upstream payloads are deserialized into these types by the HTTP
//! delegates and returned to clients inside a [`crate::RequestResult`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// PHSA Envelope
// ============================================================================

/// Whether PHSA is still loading data for a patient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadState {
    #[serde(default)]
    pub refresh_in_progress: bool,
}

/// Envelope PHSA wraps around every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhsaResult<T> {
    #[serde(default)]
    pub load_state: LoadState,
    pub result: Option<T>,
}

// ============================================================================
// Immunizations
// ============================================================================

/// Immunization as returned by PHSA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmunizationResponse {
    pub id: String,
    pub name: String,
    pub occurrence_date_time: DateTime<Utc>,
    #[serde(default)]
    pub source_system_id: String,
}

/// Immunization as presented to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmunizationEvent {
    pub id: String,
    pub name: String,
    pub date_of_immunization: DateTime<Utc>,
    pub provider_or_clinic: String,
}

impl From<ImmunizationResponse> for ImmunizationEvent {
    fn from(response: ImmunizationResponse) -> Self {
        Self {
            id: response.id,
            name: response.name,
            date_of_immunization: response.occurrence_date_time,
            provider_or_clinic: response.source_system_id,
        }
    }
}

/// A patient's immunizations and the PHSA load state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmunizationResult {
    pub load_state: LoadState,
    pub immunizations: Vec<ImmunizationEvent>,
}

// ============================================================================
// Patient Data
// ============================================================================

/// Kinds of patient data that can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientDataType {
    OrganDonorRegistrationStatus,
    DiagnosticImaging,
}

impl PatientDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrganDonorRegistrationStatus => "OrganDonorRegistrationStatus",
            Self::DiagnosticImaging => "DiagnosticImaging",
        }
    }
}

impl FromStr for PatientDataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OrganDonorRegistrationStatus" => Ok(Self::OrganDonorRegistrationStatus),
            "DiagnosticImaging" => Ok(Self::DiagnosticImaging),
            _ => Err(format!("unknown patient data type: {}", s)),
        }
    }
}

impl fmt::Display for PatientDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organ donor registration status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonorStatus {
    Registered,
    NotRegistered,
    Error,
    Pending,
}

/// Organ donor registration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganDonorRegistration {
    pub status: DonorStatus,
    pub status_message: Option<String>,
    /// Registration document, retrievable as a patient file.
    pub registration_file_id: Option<String>,
}

/// Diagnostic imaging exam record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticImagingExam {
    pub body_part: Option<String>,
    pub exam_date: Option<NaiveDate>,
    /// Exam report, retrievable as a patient file.
    pub file_id: Option<String>,
    pub health_authority: Option<String>,
    pub modality: Option<String>,
    pub organization: Option<String>,
    pub procedure_description: Option<String>,
    pub status: Option<String>,
}

/// A patient data item, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PatientData {
    OrganDonorRegistration(OrganDonorRegistration),
    DiagnosticImagingExam(DiagnosticImagingExam),
}

/// Result of a patient data query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDataResponse {
    pub items: Vec<PatientData>,
}

/// A patient document with decoded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientFile {
    pub file_id: String,
    pub media_type: String,
    pub content: Vec<u8>,
}

// ============================================================================
// Vaccine Proof
// ============================================================================

/// Vaccination status printed on a proof.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaccineState {
    #[default]
    NotSet,
    AllDosesReceived,
    PartialDosesReceived,
    Exempt,
    DefaultState,
}

/// Proof document template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VaccineProofTemplate {
    #[default]
    #[serde(rename = "BCProvincial")]
    Provincial,
    #[serde(rename = "Federal")]
    Federal,
}

/// Postal address for mailed proofs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street_lines: Vec<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// What a proof should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccineProofRequest {
    pub status: VaccineState,
    /// SMART Health Card QR code payload.
    pub smart_health_card_qr: String,
}

/// State of a proof job at BC Mail Plus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaccineProofRequestStatus {
    #[default]
    Unknown,
    Started,
    Completed,
}

/// A submitted proof job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccineProofResponse {
    pub id: String,
    pub status: VaccineProofRequestStatus,
    /// Where the generated document can be fetched once complete.
    pub asset_uri: Option<String>,
}

/// A generated proof document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportModel {
    pub file_name: String,
    /// Base64 document content.
    pub data: String,
}

// ============================================================================
// Reports
// ============================================================================

/// Output format of a generated report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportFormatType {
    #[default]
    Pdf,
    Csv,
    Xlsx,
}

impl ReportFormatType {
    /// File extension, also the CDOGS `convertTo` value.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Report templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportTemplate {
    Medication,
    Immunization,
    Laboratory,
    Encounter,
    Notes,
    DependentImmunization,
}

impl ReportTemplate {
    /// Base name of the generated file and the template resource.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Medication => "Medication",
            Self::Immunization => "Immunization",
            Self::Laboratory => "Laboratory",
            Self::Encounter => "Encounter",
            Self::Notes => "Notes",
            Self::DependentImmunization => "DependentImmunization",
        }
    }
}

/// Request to render a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    /// Data merged into the template.
    pub data: serde_json::Value,
    pub template: ReportTemplate,
    #[serde(rename = "type", default)]
    pub format: ReportFormatType,
}

/// Template sent to CDOGS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdogsTemplateModel {
    pub content: String,
    #[serde(default = "default_encoding_type")]
    pub encoding_type: String,
    #[serde(default = "default_file_type")]
    pub file_type: String,
}

fn default_encoding_type() -> String {
    "base64".to_string()
}

fn default_file_type() -> String {
    "docx".to_string()
}

impl CdogsTemplateModel {
    /// A base64 docx template.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            encoding_type: default_encoding_type(),
            file_type: default_file_type(),
        }
    }
}

/// CDOGS rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdogsOptions {
    pub convert_to: String,
    pub report_name: String,
    pub overwrite: bool,
}

/// Render request sent to CDOGS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdogsRequest {
    pub data: serde_json::Value,
    pub options: CdogsOptions,
    pub template: CdogsTemplateModel,
}

// ============================================================================
// Notification Settings
// ============================================================================

/// Notification preferences pushed to PHSA.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettingsRequest {
    #[serde(default)]
    pub email_enabled: bool,
    pub email_address: Option<String>,
    #[serde(default)]
    pub sms_enabled: bool,
    pub sms_number: Option<String>,
    pub sms_verification_code: Option<String>,
    #[serde(default)]
    pub sms_verified: bool,
}

/// Notification preferences as stored by PHSA.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettingsResponse {
    #[serde(default)]
    pub email_enabled: bool,
    pub email_address: Option<String>,
    #[serde(default)]
    pub sms_enabled: bool,
    pub sms_number: Option<String>,
    #[serde(default)]
    pub sms_verified: bool,
}

// ============================================================================
// Public COVID-19 Tests
// ============================================================================

/// Identity details for an unauthenticated COVID-19 test lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCovidTestQuery {
    pub phn: String,
    pub date_of_birth: NaiveDate,
    pub collection_date: NaiveDate,
}

/// A single COVID-19 test result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCovidTestRecord {
    pub patient_display_name: Option<String>,
    pub lab: Option<String>,
    pub reporting_source: Option<String>,
    pub collection_date_time: Option<DateTime<Utc>>,
    pub result_date_time: Option<DateTime<Utc>>,
    pub test_name: Option<String>,
    pub test_type: Option<String>,
    pub test_status: Option<String>,
    pub test_outcome: Option<String>,
    pub result_title: Option<String>,
    pub result_description: Option<Vec<String>>,
    pub result_link: Option<String>,
}

/// PHSA response to a public COVID-19 test lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicCovidTestResponse {
    #[serde(default)]
    pub loaded: bool,
    /// Milliseconds to wait before retrying when not loaded.
    #[serde(default, rename = "retryin")]
    pub retry_in: i32,
    #[serde(default)]
    pub records: Vec<PublicCovidTestRecord>,
}
