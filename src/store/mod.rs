//! Persistence collaborator for profiles and finished sessions.
//!
//! The session controller receives a store by value (or behind `Arc`) rather
//! than reaching for a global, so tests swap in [`MemoryStore`].

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use thiserror::Error;

use crate::session::types::{Session, UserProfile};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value style store keyed by user id. Implementations may fail on any
/// call; callers surface the error and do not retry.
pub trait ProfileStore {
    fn load_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>>;

    fn save_profile(&self, profile: &UserProfile) -> StoreResult<()>;

    fn save_session(&self, session: &Session) -> StoreResult<()>;

    /// Finished sessions for a user, oldest first.
    fn load_sessions(&self, user_id: &str) -> StoreResult<Vec<Session>>;
}

impl<S: ProfileStore + ?Sized> ProfileStore for Arc<S> {
    fn load_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        (**self).load_profile(user_id)
    }

    fn save_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        (**self).save_profile(profile)
    }

    fn save_session(&self, session: &Session) -> StoreResult<()> {
        (**self).save_session(session)
    }

    fn load_sessions(&self, user_id: &str) -> StoreResult<Vec<Session>> {
        (**self).load_sessions(user_id)
    }
}
