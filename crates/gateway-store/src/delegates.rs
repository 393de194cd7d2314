//! Database delegate traits.
//!
//! Services depend on these traits rather than on [`crate::Store`] so that
//! tests can substitute [`crate::memory::InMemoryStore`].

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway_core::{Communication, DataSource, Hdid, Note, Rating, UserFeedback, UserProfile};
use uuid::Uuid;

use crate::result::DbResult;

/// Persistence for encrypted user notes.
#[async_trait]
pub trait NoteDelegate: Send + Sync {
    /// Notes owned by `hdid`, newest journal date first. Status `Read`.
    async fn get_notes(&self, hdid: &Hdid, offset: i64, limit: i64) -> DbResult<Vec<Note>>;

    /// Insert a note. Status `Created`.
    async fn add_note(&self, note: &Note) -> DbResult<Note>;

    /// Update a note, checking its version. Status `Updated`, `NotFound` or `Concurrency`.
    async fn update_note(&self, note: &Note) -> DbResult<Note>;

    /// Delete a note, checking its version. Status `Deleted`, `NotFound` or `Concurrency`.
    async fn delete_note(&self, note: &Note) -> DbResult<Note>;

    /// Update several notes in one transaction. Status `Updated`.
    async fn batch_update(&self, notes: &[Note]) -> DbResult<Vec<Note>>;
}

/// Persistence for user profiles.
#[async_trait]
pub trait UserProfileDelegate: Send + Sync {
    /// Status `Read` or `NotFound`.
    async fn get_user_profile(&self, hdid: &Hdid) -> DbResult<UserProfile>;

    /// Status `Created`.
    async fn insert_user_profile(&self, profile: &UserProfile) -> DbResult<UserProfile>;

    /// Status `Updated` or `NotFound`.
    async fn update_user_profile(&self, profile: &UserProfile) -> DbResult<UserProfile>;

    /// Give `hdid` its first encryption key and store `notes`, already
    /// encrypted under it, as one unit of work.
    ///
    /// Status `Updated` with `key` as payload. When the profile already has a
    /// key nothing is written and the status is `Concurrency` with the stored
    /// key as payload. A stale note also yields `Concurrency`, without
    /// payload. `NotFound` when there is no profile.
    async fn set_first_encryption_key(
        &self,
        hdid: &Hdid,
        key: &str,
        notes: &[Note],
    ) -> DbResult<String>;
}

/// Persistence for application ratings.
#[async_trait]
pub trait RatingDelegate: Send + Sync {
    /// Status `Created`.
    async fn insert_rating(&self, rating: &Rating) -> DbResult<Rating>;
}

/// Persistence for user feedback.
#[async_trait]
pub trait FeedbackDelegate: Send + Sync {
    /// Status `Created`.
    async fn insert_user_feedback(&self, feedback: &UserFeedback) -> DbResult<UserFeedback>;
}

/// Persistence for communications (banners, in-app messages, emails).
#[async_trait]
pub trait CommunicationDelegate: Send + Sync {
    /// Status `Created`.
    async fn add(&self, communication: &Communication) -> DbResult<Communication>;

    /// Status `Updated`, `NotFound` or `Concurrency`.
    async fn update(&self, communication: &Communication) -> DbResult<Communication>;

    /// Status `Deleted` or `NotFound`.
    async fn delete(&self, id: Uuid) -> DbResult<Communication>;

    /// All communications, newest effective date first. Status `Read`.
    async fn get_all(&self) -> DbResult<Vec<Communication>>;

    /// Highest priority banner active at `now`. Status `Read` or `NotFound`.
    async fn get_active_banner(&self, now: DateTime<Utc>) -> DbResult<Communication>;
}

/// Per-patient data source blocks set by support staff.
#[async_trait]
pub trait DataAccessDelegate: Send + Sync {
    /// Data sources blocked for `hdid`. Status `Read`.
    async fn get_blocked_data_sources(&self, hdid: &Hdid) -> DbResult<HashSet<DataSource>>;
}
