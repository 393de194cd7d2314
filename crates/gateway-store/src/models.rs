//! Database models for the storage layer.
//!
//! These types map directly to database rows. They are converted to the
//! domain types in gateway-core before leaving the crate.

use chrono::{DateTime, NaiveDate, Utc};
use gateway_core::{
    Communication, CommunicationStatus, CommunicationType, Hdid, Note, UserProfile,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::StoreError;

/// Database row for the `user_profiles` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserProfileRow {
    pub hdid: String,
    pub encryption_key: Option<String>,
    pub email: Option<String>,
    pub last_login_date_time: Option<DateTime<Utc>>,
    pub created_date_time: DateTime<Utc>,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        Self {
            hdid: Hdid(row.hdid),
            encryption_key: row.encryption_key,
            email: row.email,
            last_login_date_time: row.last_login_date_time,
            created_date_time: row.created_date_time,
        }
    }
}

/// Database row for the `notes` table.
#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub hdid: String,
    pub title: Option<String>,
    pub text: Option<String>,
    pub journal_date: NaiveDate,
    pub version: i64,
    pub created_date_time: DateTime<Utc>,
    pub updated_date_time: DateTime<Utc>,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Self {
            id: row.id,
            hdid: Hdid(row.hdid),
            title: row.title,
            text: row.text,
            journal_date: row.journal_date,
            version: row.version,
            created_date_time: row.created_date_time,
            updated_date_time: row.updated_date_time,
        }
    }
}

/// Database row for the `communications` table.
#[derive(Debug, Clone, FromRow)]
pub struct CommunicationRow {
    pub id: Uuid,
    pub subject: String,
    pub text: String,
    pub communication_type: String,
    pub communication_status: String,
    pub priority: i32,
    pub effective_date_time: DateTime<Utc>,
    pub expiry_date_time: DateTime<Utc>,
    pub version: i64,
}

impl TryFrom<CommunicationRow> for Communication {
    type Error = StoreError;

    fn try_from(row: CommunicationRow) -> Result<Self, Self::Error> {
        let communication_type: CommunicationType = row
            .communication_type
            .parse()
            .map_err(StoreError::InvalidValue)?;
        let communication_status: CommunicationStatus = row
            .communication_status
            .parse()
            .map_err(StoreError::InvalidValue)?;

        Ok(Self {
            id: row.id,
            subject: row.subject,
            text: row.text,
            communication_type,
            communication_status,
            priority: row.priority,
            effective_date_time: row.effective_date_time,
            expiry_date_time: row.expiry_date_time,
            version: row.version,
        })
    }
}
