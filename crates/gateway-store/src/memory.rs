//! In-memory delegates for testing.
//!
//! [`InMemoryStore`] implements every delegate trait over `HashMap`s and can
//! be told to answer a given operation with a fixed status, which lets tests
//! drive services down their failure paths.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway_core::{Communication, DataSource, Hdid, Note, Rating, UserFeedback, UserProfile};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::delegates::{
    CommunicationDelegate, DataAccessDelegate, FeedbackDelegate, NoteDelegate, RatingDelegate,
    UserProfileDelegate,
};
use crate::result::{DbResult, DbStatusCode};

/// Delegate operations whose outcome can be forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetNotes,
    AddNote,
    UpdateNote,
    DeleteNote,
    BatchUpdateNotes,
    GetUserProfile,
    InsertUserProfile,
    UpdateUserProfile,
    SetFirstEncryptionKey,
    InsertRating,
    InsertUserFeedback,
    AddCommunication,
    UpdateCommunication,
    DeleteCommunication,
    GetCommunications,
    GetActiveBanner,
    GetBlockedDataSources,
}

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<Hdid, UserProfile>,
    notes: HashMap<Uuid, Note>,
    ratings: Vec<Rating>,
    feedback: Vec<UserFeedback>,
    communications: HashMap<Uuid, Communication>,
    blocked: HashMap<Hdid, HashSet<DataSource>>,
}

impl Tables {
    /// Version-checked update of note content. Nothing changes when any
    /// note is stale.
    fn update_notes(&mut self, notes: &[Note]) -> DbResult<Vec<Note>> {
        let stale = notes.iter().find(|note| {
            self.notes
                .get(&note.id)
                .is_none_or(|existing| existing.version != note.version)
        });
        if let Some(note) = stale {
            return DbResult::status(
                DbStatusCode::Concurrency,
                format!("Note {} was changed by another request", note.id),
            );
        }

        let now = Utc::now();
        let mut updated = Vec::with_capacity(notes.len());
        for note in notes {
            if let Some(existing) = self.notes.get_mut(&note.id) {
                existing.title = note.title.clone();
                existing.text = note.text.clone();
                existing.version += 1;
                existing.updated_date_time = now;
                updated.push(existing.clone());
            }
        }
        DbResult::new(DbStatusCode::Updated, updated)
    }
}

/// In-memory implementation of every delegate trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    forced: RwLock<HashMap<Operation, DbStatusCode>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every future call of `operation` with `status` and no payload.
    pub async fn force_status(&self, operation: Operation, status: DbStatusCode) {
        self.forced.write().await.insert(operation, status);
    }

    /// Stop forcing the outcome of `operation`.
    pub async fn clear_forced(&self, operation: Operation) {
        self.forced.write().await.remove(&operation);
    }

    /// Block a data source for a patient.
    pub async fn block_data_source(&self, hdid: &Hdid, source: DataSource) {
        self.tables
            .write()
            .await
            .blocked
            .entry(hdid.clone())
            .or_default()
            .insert(source);
    }

    /// Insert or replace a profile directly.
    pub async fn put_profile(&self, profile: UserProfile) {
        self.tables
            .write()
            .await
            .profiles
            .insert(profile.hdid.clone(), profile);
    }

    /// Insert or replace a stored note directly.
    pub async fn put_note(&self, note: Note) {
        self.tables.write().await.notes.insert(note.id, note);
    }

    /// Stored notes of `hdid`, as persisted.
    pub async fn stored_notes(&self, hdid: &Hdid) -> Vec<Note> {
        self.tables
            .read()
            .await
            .notes
            .values()
            .filter(|n| &n.hdid == hdid)
            .cloned()
            .collect()
    }

    /// All stored ratings.
    pub async fn ratings(&self) -> Vec<Rating> {
        self.tables.read().await.ratings.clone()
    }

    /// All stored feedback.
    pub async fn feedback(&self) -> Vec<UserFeedback> {
        self.tables.read().await.feedback.clone()
    }

    async fn forced<T>(&self, operation: Operation) -> Option<DbResult<T>> {
        self.forced
            .read()
            .await
            .get(&operation)
            .map(|status| DbResult::status(*status, format!("forced {:?}", operation)))
    }
}

#[async_trait]
impl NoteDelegate for InMemoryStore {
    async fn get_notes(&self, hdid: &Hdid, offset: i64, limit: i64) -> DbResult<Vec<Note>> {
        if let Some(result) = self.forced(Operation::GetNotes).await {
            return result;
        }

        let mut notes = self.stored_notes(hdid).await;
        notes.sort_by(|a, b| {
            b.journal_date
                .cmp(&a.journal_date)
                .then(b.created_date_time.cmp(&a.created_date_time))
        });
        let notes = notes
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        DbResult::new(DbStatusCode::Read, notes)
    }

    async fn add_note(&self, note: &Note) -> DbResult<Note> {
        if let Some(result) = self.forced(Operation::AddNote).await {
            return result;
        }

        let mut tables = self.tables.write().await;
        if tables.notes.contains_key(&note.id) {
            return DbResult::error(format!("duplicate note {}", note.id));
        }
        let now = Utc::now();
        let stored = Note {
            version: 0,
            created_date_time: now,
            updated_date_time: now,
            ..note.clone()
        };
        tables.notes.insert(stored.id, stored.clone());
        DbResult::new(DbStatusCode::Created, stored)
    }

    async fn update_note(&self, note: &Note) -> DbResult<Note> {
        if let Some(result) = self.forced(Operation::UpdateNote).await {
            return result;
        }

        let mut tables = self.tables.write().await;
        match tables.notes.get_mut(&note.id) {
            Some(existing) if existing.hdid != note.hdid => {
                DbResult::status(DbStatusCode::NotFound, "Note not found")
            }
            Some(existing) if existing.version != note.version => DbResult::status(
                DbStatusCode::Concurrency,
                "Note was changed by another request",
            ),
            Some(existing) => {
                existing.title = note.title.clone();
                existing.text = note.text.clone();
                existing.journal_date = note.journal_date;
                existing.version += 1;
                existing.updated_date_time = Utc::now();
                DbResult::new(DbStatusCode::Updated, existing.clone())
            }
            None => DbResult::status(DbStatusCode::NotFound, "Note not found"),
        }
    }

    async fn delete_note(&self, note: &Note) -> DbResult<Note> {
        if let Some(result) = self.forced(Operation::DeleteNote).await {
            return result;
        }

        let mut tables = self.tables.write().await;
        match tables.notes.get(&note.id) {
            Some(existing) if existing.hdid != note.hdid => {
                DbResult::status(DbStatusCode::NotFound, "Note not found")
            }
            Some(existing) if existing.version != note.version => DbResult::status(
                DbStatusCode::Concurrency,
                "Note was changed by another request",
            ),
            Some(_) => match tables.notes.remove(&note.id) {
                Some(removed) => DbResult::new(DbStatusCode::Deleted, removed),
                None => DbResult::status(DbStatusCode::NotFound, "Note not found"),
            },
            None => DbResult::status(DbStatusCode::NotFound, "Note not found"),
        }
    }

    async fn batch_update(&self, notes: &[Note]) -> DbResult<Vec<Note>> {
        if let Some(result) = self.forced(Operation::BatchUpdateNotes).await {
            return result;
        }

        self.tables.write().await.update_notes(notes)
    }
}

#[async_trait]
impl UserProfileDelegate for InMemoryStore {
    async fn get_user_profile(&self, hdid: &Hdid) -> DbResult<UserProfile> {
        if let Some(result) = self.forced(Operation::GetUserProfile).await {
            return result;
        }

        match self.tables.read().await.profiles.get(hdid) {
            Some(profile) => DbResult::new(DbStatusCode::Read, profile.clone()),
            None => DbResult::status(DbStatusCode::NotFound, "User profile not found"),
        }
    }

    async fn insert_user_profile(&self, profile: &UserProfile) -> DbResult<UserProfile> {
        if let Some(result) = self.forced(Operation::InsertUserProfile).await {
            return result;
        }

        let mut tables = self.tables.write().await;
        if tables.profiles.contains_key(&profile.hdid) {
            return DbResult::error("duplicate user profile");
        }
        tables.profiles.insert(profile.hdid.clone(), profile.clone());
        DbResult::new(DbStatusCode::Created, profile.clone())
    }

    async fn update_user_profile(&self, profile: &UserProfile) -> DbResult<UserProfile> {
        if let Some(result) = self.forced(Operation::UpdateUserProfile).await {
            return result;
        }

        match self.tables.write().await.profiles.get_mut(&profile.hdid) {
            Some(existing) => {
                existing.encryption_key = profile.encryption_key.clone();
                existing.email = profile.email.clone();
                existing.last_login_date_time = profile.last_login_date_time;
                DbResult::new(DbStatusCode::Updated, existing.clone())
            }
            None => DbResult::status(DbStatusCode::NotFound, "User profile not found"),
        }
    }

    async fn set_first_encryption_key(
        &self,
        hdid: &Hdid,
        key: &str,
        notes: &[Note],
    ) -> DbResult<String> {
        if let Some(result) = self.forced(Operation::SetFirstEncryptionKey).await {
            return result;
        }

        let mut tables = self.tables.write().await;
        match tables.profiles.get(hdid) {
            None => return DbResult::status(DbStatusCode::NotFound, "User profile not found"),
            Some(UserProfile {
                encryption_key: Some(existing),
                ..
            }) => {
                return DbResult {
                    payload: Some(existing.clone()),
                    status: DbStatusCode::Concurrency,
                    message: "Profile key was set by another request".to_string(),
                };
            }
            Some(_) => {}
        }

        let batch = tables.update_notes(notes);
        if !batch.is(DbStatusCode::Updated) {
            return DbResult::status(batch.status, batch.message);
        }
        if let Some(profile) = tables.profiles.get_mut(hdid) {
            profile.encryption_key = Some(key.to_string());
        }
        DbResult::new(DbStatusCode::Updated, key.to_string())
    }
}

#[async_trait]
impl RatingDelegate for InMemoryStore {
    async fn insert_rating(&self, rating: &Rating) -> DbResult<Rating> {
        if let Some(result) = self.forced(Operation::InsertRating).await {
            return result;
        }

        self.tables.write().await.ratings.push(rating.clone());
        DbResult::new(DbStatusCode::Created, rating.clone())
    }
}

#[async_trait]
impl FeedbackDelegate for InMemoryStore {
    async fn insert_user_feedback(&self, feedback: &UserFeedback) -> DbResult<UserFeedback> {
        if let Some(result) = self.forced(Operation::InsertUserFeedback).await {
            return result;
        }

        self.tables.write().await.feedback.push(feedback.clone());
        DbResult::new(DbStatusCode::Created, feedback.clone())
    }
}

#[async_trait]
impl CommunicationDelegate for InMemoryStore {
    async fn add(&self, communication: &Communication) -> DbResult<Communication> {
        if let Some(result) = self.forced(Operation::AddCommunication).await {
            return result;
        }

        let stored = Communication {
            version: 0,
            ..communication.clone()
        };
        self.tables
            .write()
            .await
            .communications
            .insert(stored.id, stored.clone());
        DbResult::new(DbStatusCode::Created, stored)
    }

    async fn update(&self, communication: &Communication) -> DbResult<Communication> {
        if let Some(result) = self.forced(Operation::UpdateCommunication).await {
            return result;
        }

        let mut tables = self.tables.write().await;
        match tables.communications.get_mut(&communication.id) {
            Some(existing) if existing.version != communication.version => DbResult::status(
                DbStatusCode::Concurrency,
                "Communication was changed by another request",
            ),
            Some(existing) => {
                *existing = Communication {
                    version: existing.version + 1,
                    ..communication.clone()
                };
                DbResult::new(DbStatusCode::Updated, existing.clone())
            }
            None => DbResult::status(DbStatusCode::NotFound, "Communication not found"),
        }
    }

    async fn delete(&self, id: Uuid) -> DbResult<Communication> {
        if let Some(result) = self.forced(Operation::DeleteCommunication).await {
            return result;
        }

        match self.tables.write().await.communications.remove(&id) {
            Some(removed) => DbResult::new(DbStatusCode::Deleted, removed),
            None => DbResult::status(DbStatusCode::NotFound, "Communication not found"),
        }
    }

    async fn get_all(&self) -> DbResult<Vec<Communication>> {
        if let Some(result) = self.forced(Operation::GetCommunications).await {
            return result;
        }

        let mut all: Vec<Communication> = self
            .tables
            .read()
            .await
            .communications
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| b.effective_date_time.cmp(&a.effective_date_time));
        DbResult::new(DbStatusCode::Read, all)
    }

    async fn get_active_banner(&self, now: DateTime<Utc>) -> DbResult<Communication> {
        if let Some(result) = self.forced(Operation::GetActiveBanner).await {
            return result;
        }

        let tables = self.tables.read().await;
        let banner = tables
            .communications
            .values()
            .filter(|c| {
                c.communication_type == gateway_core::CommunicationType::Banner
                    && c.is_active_at(now)
            })
            .max_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then(a.effective_date_time.cmp(&b.effective_date_time))
            });

        match banner {
            Some(banner) => DbResult::new(DbStatusCode::Read, banner.clone()),
            None => DbResult::status(DbStatusCode::NotFound, "No active banner"),
        }
    }
}

#[async_trait]
impl DataAccessDelegate for InMemoryStore {
    async fn get_blocked_data_sources(&self, hdid: &Hdid) -> DbResult<HashSet<DataSource>> {
        if let Some(result) = self.forced(Operation::GetBlockedDataSources).await {
            return result;
        }

        let blocked = self
            .tables
            .read()
            .await
            .blocked
            .get(hdid)
            .cloned()
            .unwrap_or_default();
        DbResult::new(DbStatusCode::Read, blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn note(hdid: &str, day: u32) -> Note {
        let now = Utc::now();
        Note {
            id: Uuid::new_v4(),
            hdid: Hdid::from(hdid),
            title: Some(format!("title {}", day)),
            text: Some("text".into()),
            journal_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            version: 0,
            created_date_time: now,
            updated_date_time: now,
        }
    }

    #[tokio::test]
    async fn test_notes_paged_newest_first() {
        let store = InMemoryStore::new();
        for day in 1..=5 {
            store.add_note(&note("A", day)).await;
        }
        store.add_note(&note("B", 9)).await;

        let page = store.get_notes(&Hdid::from("A"), 1, 2).await;
        assert_eq!(page.status, DbStatusCode::Read);
        let titles: Vec<_> = page
            .payload
            .unwrap()
            .into_iter()
            .map(|n| n.title.unwrap())
            .collect();
        assert_eq!(titles, vec!["title 4", "title 3"]);
    }

    #[tokio::test]
    async fn test_update_note_checks_version() {
        let store = InMemoryStore::new();
        let created = store.add_note(&note("A", 1)).await.payload.unwrap();

        let updated = store.update_note(&created).await;
        assert_eq!(updated.status, DbStatusCode::Updated);
        assert_eq!(updated.payload.unwrap().version, 1);

        let stale = store.update_note(&created).await;
        assert_eq!(stale.status, DbStatusCode::Concurrency);
    }

    #[tokio::test]
    async fn test_delete_note_other_owner_not_found() {
        let store = InMemoryStore::new();
        let created = store.add_note(&note("A", 1)).await.payload.unwrap();
        let foreign = Note {
            hdid: Hdid::from("B"),
            ..created.clone()
        };
        assert_eq!(
            store.delete_note(&foreign).await.status,
            DbStatusCode::NotFound
        );
        assert_eq!(
            store.delete_note(&created).await.status,
            DbStatusCode::Deleted
        );
    }

    #[tokio::test]
    async fn test_first_encryption_key_set_once() {
        let store = InMemoryStore::new();
        let hdid = Hdid::from("A");
        store.put_profile(UserProfile::new(hdid.clone())).await;
        let created = store.add_note(&note("A", 1)).await.payload.unwrap();
        let encrypted = Note {
            title: Some("sealed".into()),
            ..created.clone()
        };

        let first = store
            .set_first_encryption_key(&hdid, "key-1", &[encrypted.clone()])
            .await;
        assert_eq!(first.status, DbStatusCode::Updated);
        assert_eq!(first.payload.as_deref(), Some("key-1"));

        let second = store
            .set_first_encryption_key(&hdid, "key-2", &[encrypted])
            .await;
        assert_eq!(second.status, DbStatusCode::Concurrency);
        assert_eq!(second.payload.as_deref(), Some("key-1"));

        let profile = store.get_user_profile(&hdid).await.payload.unwrap();
        assert_eq!(profile.encryption_key.as_deref(), Some("key-1"));
        let stored = store.stored_notes(&hdid).await;
        assert_eq!(stored[0].title.as_deref(), Some("sealed"));
        assert_eq!(stored[0].version, 1);
    }

    #[tokio::test]
    async fn test_first_encryption_key_stale_note_writes_nothing() {
        let store = InMemoryStore::new();
        let hdid = Hdid::from("A");
        store.put_profile(UserProfile::new(hdid.clone())).await;
        let created = store.add_note(&note("A", 1)).await.payload.unwrap();
        store.update_note(&created).await;

        let result = store
            .set_first_encryption_key(&hdid, "key-1", &[created])
            .await;
        assert_eq!(result.status, DbStatusCode::Concurrency);
        assert!(result.payload.is_none());

        let profile = store.get_user_profile(&hdid).await.payload.unwrap();
        assert!(profile.encryption_key.is_none());
        assert_eq!(
            store.set_first_encryption_key(&Hdid::from("B"), "k", &[]).await.status,
            DbStatusCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_forced_status() {
        let store = InMemoryStore::new();
        store
            .force_status(Operation::InsertRating, DbStatusCode::Error)
            .await;
        let rating = Rating {
            id: Uuid::new_v4(),
            rating_value: 5,
            skip: false,
            created_date_time: Utc::now(),
        };
        let result = store.insert_rating(&rating).await;
        assert_eq!(result.status, DbStatusCode::Error);
        assert!(result.payload.is_none());
        assert!(store.ratings().await.is_empty());

        store.clear_forced(Operation::InsertRating).await;
        assert_eq!(
            store.insert_rating(&rating).await.status,
            DbStatusCode::Created
        );
    }

    #[tokio::test]
    async fn test_blocked_data_sources() {
        let store = InMemoryStore::new();
        let hdid = Hdid::from("A");
        store.block_data_source(&hdid, DataSource::Note).await;
        let blocked = store.get_blocked_data_sources(&hdid).await.payload.unwrap();
        assert!(blocked.contains(&DataSource::Note));
        let none = store
            .get_blocked_data_sources(&Hdid::from("B"))
            .await
            .payload
            .unwrap();
        assert!(none.is_empty());
    }
}
