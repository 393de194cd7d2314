//! Core data types for the Health Gateway.
//!
//! These are flat DTOs: each mirrors a database row or an API payload and
//! carries no behaviour beyond simple validation and mapping. All API-facing
//! types serialize as camelCase JSON.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{CryptoDelegate, CryptoError};

// ============================================================================
// ID Types
// ============================================================================

/// Health Directory Identifier, the primary key of a user across services.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hdid(pub String);

impl Hdid {
    /// Creates an Hdid from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty or only whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Hdid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Hdid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Hdid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// User Profile
// ============================================================================

/// A registered user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub hdid: Hdid,
    /// Key used to encrypt the user's notes. Generated lazily on first note access.
    pub encryption_key: Option<String>,
    pub email: Option<String>,
    pub last_login_date_time: Option<DateTime<Utc>>,
    pub created_date_time: DateTime<Utc>,
}

impl UserProfile {
    /// New profile with no encryption key.
    pub fn new(hdid: Hdid) -> Self {
        Self {
            hdid,
            encryption_key: None,
            email: None,
            last_login_date_time: None,
            created_date_time: Utc::now(),
        }
    }
}

/// Sources of patient data whose display can be blocked per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    Immunization,
    Laboratory,
    Medication,
    Note,
    OrganDonorRegistration,
    DiagnosticImaging,
}

impl DataSource {
    /// Name persisted in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immunization => "Immunization",
            Self::Laboratory => "Laboratory",
            Self::Medication => "Medication",
            Self::Note => "Note",
            Self::OrganDonorRegistration => "OrganDonorRegistration",
            Self::DiagnosticImaging => "DiagnosticImaging",
        }
    }
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Immunization" => Ok(Self::Immunization),
            "Laboratory" => Ok(Self::Laboratory),
            "Medication" => Ok(Self::Medication),
            "Note" => Ok(Self::Note),
            "OrganDonorRegistration" => Ok(Self::OrganDonorRegistration),
            "DiagnosticImaging" => Ok(Self::DiagnosticImaging),
            other => Err(format!("unknown data source: {}", other)),
        }
    }
}

// ============================================================================
// Notes
// ============================================================================

/// A note as stored: title and text are encrypted with the profile key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub hdid: Hdid,
    pub title: Option<String>,
    pub text: Option<String>,
    pub journal_date: NaiveDate,
    pub version: i64,
    pub created_date_time: DateTime<Utc>,
    pub updated_date_time: DateTime<Utc>,
}

/// A note as seen by the user, in plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNote {
    #[serde(default)]
    pub id: Uuid,
    pub hd_id: Hdid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub journal_date: NaiveDate,
    #[serde(default)]
    pub version: i64,
    #[serde(default = "Utc::now")]
    pub created_date_time: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_date_time: DateTime<Utc>,
}

impl UserNote {
    /// Encrypt this note's content with `key` for storage.
    pub fn to_note(&self, crypto: &dyn CryptoDelegate, key: &str) -> Result<Note, CryptoError> {
        Ok(Note {
            id: self.id,
            hdid: self.hd_id.clone(),
            title: Some(crypto.encrypt(key, self.title.as_deref().unwrap_or_default())?),
            text: Some(crypto.encrypt(key, self.text.as_deref().unwrap_or_default())?),
            journal_date: self.journal_date,
            version: self.version,
            created_date_time: self.created_date_time,
            updated_date_time: self.updated_date_time,
        })
    }

    /// Decrypt a stored note with `key`.
    pub fn from_note(note: &Note, crypto: &dyn CryptoDelegate, key: &str) -> Result<Self, CryptoError> {
        let decrypt = |value: &Option<String>| -> Result<Option<String>, CryptoError> {
            value.as_deref().map(|v| crypto.decrypt(key, v)).transpose()
        };

        Ok(Self {
            id: note.id,
            hd_id: note.hdid.clone(),
            title: decrypt(&note.title)?,
            text: decrypt(&note.text)?,
            journal_date: note.journal_date,
            version: note.version,
            created_date_time: note.created_date_time,
            updated_date_time: note.updated_date_time,
        })
    }
}

// ============================================================================
// Feedback
// ============================================================================

/// An anonymous application rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    #[serde(default)]
    pub id: Uuid,
    pub rating_value: i32,
    #[serde(default)]
    pub skip: bool,
    #[serde(default = "Utc::now")]
    pub created_date_time: DateTime<Utc>,
}

impl Rating {
    /// Ratings range from 1 to 5. A skipped rating carries no value check.
    pub fn is_valid(&self) -> bool {
        self.skip || (1..=5).contains(&self.rating_value)
    }
}

/// Free-form feedback submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFeedback {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub user_profile_id: Option<Hdid>,
    #[serde(default)]
    pub is_satisfied: bool,
    #[serde(default)]
    pub is_reviewed: bool,
    #[serde(default = "Utc::now")]
    pub created_date_time: DateTime<Utc>,
}

// ============================================================================
// Communications
// ============================================================================

/// Channel a communication is delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommunicationType {
    Banner,
    InApp,
    Email,
}

impl CommunicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Banner => "Banner",
            Self::InApp => "InApp",
            Self::Email => "Email",
        }
    }
}

impl FromStr for CommunicationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Banner" => Ok(Self::Banner),
            "InApp" => Ok(Self::InApp),
            "Email" => Ok(Self::Email),
            other => Err(format!("unknown communication type: {}", other)),
        }
    }
}

/// Publication state of a communication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommunicationStatus {
    New,
    Draft,
    Pending,
    Processed,
}

impl CommunicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Draft => "Draft",
            Self::Pending => "Pending",
            Self::Processed => "Processed",
        }
    }
}

impl FromStr for CommunicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Draft" => Ok(Self::Draft),
            "Pending" => Ok(Self::Pending),
            "Processed" => Ok(Self::Processed),
            other => Err(format!("unknown communication status: {}", other)),
        }
    }
}

/// An administrator-authored message shown to users for a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    #[serde(default)]
    pub id: Uuid,
    pub subject: String,
    pub text: String,
    pub communication_type: CommunicationType,
    pub communication_status: CommunicationStatus,
    #[serde(default)]
    pub priority: i32,
    pub effective_date_time: DateTime<Utc>,
    pub expiry_date_time: DateTime<Utc>,
    #[serde(default)]
    pub version: i64,
}

impl Communication {
    /// Whether the effective date does not come after the expiry date.
    pub fn has_valid_dates(&self) -> bool {
        self.effective_date_time <= self.expiry_date_time
    }

    /// Whether the communication is visible at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.effective_date_time <= now && now <= self.expiry_date_time
    }
}

// ============================================================================
// Agent Access
// ============================================================================

/// Identity provider an administrative agent signs in through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeycloakIdentityProvider {
    Idir,
    PhsaAzure,
}

impl KeycloakIdentityProvider {
    /// Alias the provider is registered under in Keycloak.
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Idir => "idir",
            Self::PhsaAzure => "phsaazure",
        }
    }

    /// Provider for a Keycloak username of the form `<name>@<alias>`.
    pub fn from_username(username: &str) -> Option<Self> {
        let (_, suffix) = username.rsplit_once('@')?;
        match suffix.to_ascii_lowercase().as_str() {
            "idir" => Some(Self::Idir),
            "phsaazure" => Some(Self::PhsaAzure),
            _ => None,
        }
    }
}

/// Role granting access to parts of the administration site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdentityAccessRole {
    AdminUser,
    AdminReviewer,
    AdminAnalyst,
    SupportUser,
}

impl IdentityAccessRole {
    /// Realm role name in Keycloak.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdminUser => "AdminUser",
            Self::AdminReviewer => "AdminReviewer",
            Self::AdminAnalyst => "AdminAnalyst",
            Self::SupportUser => "SupportUser",
        }
    }

    /// All roles the administration site manages.
    pub fn all() -> [Self; 4] {
        [
            Self::AdminUser,
            Self::AdminReviewer,
            Self::AdminAnalyst,
            Self::SupportUser,
        ]
    }
}

impl FromStr for IdentityAccessRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role: {}", s))
    }
}

/// An agent with access to the administration site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAgent {
    #[serde(default)]
    pub id: Uuid,
    pub username: String,
    pub identity_provider: KeycloakIdentityProvider,
    #[serde(default)]
    pub roles: BTreeSet<IdentityAccessRole>,
}
