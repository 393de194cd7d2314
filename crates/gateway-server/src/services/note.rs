//! Encrypted user notes.
//!
//! Note content is encrypted with the owner's profile key. Profiles created
//! before keys existed get one the first time their notes are read, at which
//! point their stored plaintext notes are encrypted in place.

use std::sync::Arc;

use gateway_core::{
    CryptoDelegate, DataSource, ErrorType, Hdid, Note, RequestResult, ServiceType, UserNote,
};
use gateway_store::{DataAccessDelegate, DbResult, DbStatusCode, NoteDelegate, UserProfileDelegate};

use super::DatabaseError;

/// Page size used when the caller does not give one.
pub const DEFAULT_PAGE_SIZE: i64 = 500;

/// Service for user notes.
#[derive(Clone)]
pub struct NoteService {
    notes: Arc<dyn NoteDelegate>,
    profiles: Arc<dyn UserProfileDelegate>,
    data_access: Arc<dyn DataAccessDelegate>,
    crypto: Arc<dyn CryptoDelegate>,
}

impl NoteService {
    pub fn new(
        notes: Arc<dyn NoteDelegate>,
        profiles: Arc<dyn UserProfileDelegate>,
        data_access: Arc<dyn DataAccessDelegate>,
        crypto: Arc<dyn CryptoDelegate>,
    ) -> Self {
        Self {
            notes,
            profiles,
            data_access,
            crypto,
        }
    }

    pub async fn create_note(&self, note: &UserNote) -> RequestResult<UserNote> {
        let Some(key) = self.profile_key(&note.hd_id).await else {
            return key_not_set();
        };
        let stored = match note.to_note(self.crypto.as_ref(), &key) {
            Ok(stored) => stored,
            Err(e) => return crypto_failure(e),
        };

        let result = self.notes.add_note(&stored).await;
        self.decrypted(result, DbStatusCode::Created, &key)
    }

    /// Notes of `hdid`, newest first.
    ///
    /// Returns [`DatabaseError`] when a missing profile key cannot be
    /// generated and stored.
    pub async fn get_notes(
        &self,
        hdid: &Hdid,
        page: i64,
        page_size: i64,
    ) -> Result<RequestResult<Vec<UserNote>>, DatabaseError> {
        if !self.can_access(hdid).await {
            tracing::debug!("Note data source is blocked for patient");
            return Ok(RequestResult::success_page(Vec::new(), 0, page, page_size));
        }

        let Some(offset) = page.checked_mul(page_size) else {
            return Ok(RequestResult::error(ErrorType::InvalidState, "Page is out of range"));
        };
        let mut result = self.notes.get_notes(hdid, offset, page_size).await;

        let profile = self.profiles.get_user_profile(hdid).await;
        let Some(profile) = profile.payload else {
            tracing::warn!(status = ?profile.status, "No user profile for notes owner");
            return Ok(RequestResult::error(
                ErrorType::InvalidState,
                "User profile not found",
            ));
        };

        let key = match profile.encryption_key {
            Some(key) => key,
            None => {
                let key = self.encrypt_first_time(hdid).await?;
                result = self.notes.get_notes(hdid, offset, page_size).await;
                key
            }
        };

        if !result.is(DbStatusCode::Read) {
            return Ok(database_error(result.message));
        }

        let notes = result.payload.unwrap_or_default();
        let count = notes.len() as i64;
        let decrypted: Result<Vec<UserNote>, _> = notes
            .iter()
            .map(|note| UserNote::from_note(note, self.crypto.as_ref(), &key))
            .collect();

        Ok(match decrypted {
            Ok(notes) => RequestResult::success_page(notes, count, page, page_size),
            Err(e) => crypto_failure(e),
        })
    }

    pub async fn update_note(&self, note: &UserNote) -> RequestResult<UserNote> {
        let Some(key) = self.profile_key(&note.hd_id).await else {
            return key_not_set();
        };
        let stored = match note.to_note(self.crypto.as_ref(), &key) {
            Ok(stored) => stored,
            Err(e) => return crypto_failure(e),
        };

        let result = self.notes.update_note(&stored).await;
        self.decrypted(result, DbStatusCode::Updated, &key)
    }

    pub async fn delete_note(&self, note: &UserNote) -> RequestResult<UserNote> {
        let Some(key) = self.profile_key(&note.hd_id).await else {
            return key_not_set();
        };
        let stored = match note.to_note(self.crypto.as_ref(), &key) {
            Ok(stored) => stored,
            Err(e) => return crypto_failure(e),
        };

        let result = self.notes.delete_note(&stored).await;
        self.decrypted(result, DbStatusCode::Deleted, &key)
    }

    // ========================================================================
    // Helper Functions
    // ========================================================================

    async fn profile_key(&self, hdid: &Hdid) -> Option<String> {
        let key = self
            .profiles
            .get_user_profile(hdid)
            .await
            .payload
            .and_then(|profile| profile.encryption_key);
        if key.is_none() {
            tracing::error!("Profile does not have an encryption key");
        }
        key
    }

    async fn can_access(&self, hdid: &Hdid) -> bool {
        let blocked = self.data_access.get_blocked_data_sources(hdid).await;
        !blocked
            .payload
            .is_some_and(|sources| sources.contains(&DataSource::Note))
    }

    /// Generate a key for `hdid` and encrypt every stored note with it.
    ///
    /// Key and notes are stored together. When another request stored a key
    /// first, that key is returned and this one is discarded.
    async fn encrypt_first_time(&self, hdid: &Hdid) -> Result<String, DatabaseError> {
        let all = self.notes.get_notes(hdid, 0, i64::MAX).await;
        if !all.is(DbStatusCode::Read) {
            return Err(DatabaseError::new(all.message));
        }

        tracing::debug!("Generating encryption key for profile");
        let key = self.crypto.generate_key();

        let notes = all.payload.unwrap_or_default();
        let mut encrypted = Vec::with_capacity(notes.len());
        for mut note in notes {
            let title = note.title.take().unwrap_or_default();
            let text = note.text.take().unwrap_or_default();
            note.title = Some(self.encrypt(&key, &title)?);
            note.text = Some(self.encrypt(&key, &text)?);
            encrypted.push(note);
        }

        let stored = self
            .profiles
            .set_first_encryption_key(hdid, &key, &encrypted)
            .await;
        match (stored.status, stored.payload) {
            (DbStatusCode::Updated, _) => {
                tracing::info!(count = encrypted.len(), "Encrypted existing notes with new profile key");
                Ok(key)
            }
            (DbStatusCode::Concurrency, Some(existing)) => {
                tracing::debug!("Profile key was stored by another request");
                Ok(existing)
            }
            (status, _) => {
                tracing::error!(status = ?status, "Unable to store profile key");
                Err(DatabaseError::new(stored.message))
            }
        }
    }

    fn encrypt(&self, key: &str, value: &str) -> Result<String, DatabaseError> {
        self.crypto
            .encrypt(key, value)
            .map_err(|e| DatabaseError::new(e.to_string()))
    }

    fn decrypted(
        &self,
        result: DbResult<Note>,
        expected: DbStatusCode,
        key: &str,
    ) -> RequestResult<UserNote> {
        if !result.is(expected) {
            return database_error(result.message);
        }
        let Some(note) = result.payload else {
            return database_error("Missing note in database response");
        };
        match UserNote::from_note(&note, self.crypto.as_ref(), key) {
            Ok(note) => RequestResult::success(note),
            Err(e) => crypto_failure(e),
        }
    }
}

fn key_not_set<T>() -> RequestResult<T> {
    RequestResult::error(ErrorType::InvalidState, "Profile Key not set")
}

fn database_error<T>(message: impl Into<String>) -> RequestResult<T> {
    RequestResult::service_error(
        ErrorType::CommunicationInternal,
        ServiceType::Database,
        message,
    )
}

fn crypto_failure<T>(error: gateway_core::CryptoError) -> RequestResult<T> {
    tracing::error!(error = %error, "Unable to process note content");
    RequestResult::error(ErrorType::InvalidState, error.to_string())
}
