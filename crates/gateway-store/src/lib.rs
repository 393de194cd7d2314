//! gateway-store: Storage layer for the Health Gateway
//!
//! This crate provides:
//! - Delegate traits for notes, profiles, ratings, feedback, communications
//!   and data source blocks
//! - A PostgreSQL implementation of every delegate via sqlx
//! - An in-memory implementation for tests
//! - Embedded migrations
//!
//! Delegate calls never return `Err`. They report the outcome as a
//! [`DbResult`] whose [`DbStatusCode`] services map into the result envelope.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gateway_store::{NoteDelegate, Store, StoreConfig};
//!
//! let config = StoreConfig::from_env()?;
//! let store = Store::connect(config).await?;
//!
//! let notes = store.get_notes(&hdid, 0, 500).await;
//! ```

pub mod delegates;
pub mod error;
pub mod memory;
pub mod models;
pub mod result;
pub mod schema;
pub mod store;

pub use delegates::{
    CommunicationDelegate, DataAccessDelegate, FeedbackDelegate, NoteDelegate, RatingDelegate,
    UserProfileDelegate,
};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use result::{DbResult, DbStatusCode};
pub use store::{Store, StoreConfig};

// Re-export gateway-core for downstream crates
pub use gateway_core;
