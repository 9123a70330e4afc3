pub mod controller;
pub mod stats;
pub mod tracker;
pub mod types;

pub use controller::{AnswerOutcome, SessionController, TickOutcome};
pub use tracker::PerformanceTracker;
pub use types::*;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no enabled operation produced a problem")]
    NoEnabledOperations,
    #[error("a session is already in progress")]
    SessionInProgress,
    #[error("no session has been started")]
    NoActiveSession,
    #[error("session is {0}, not active")]
    NotActive(&'static str),
    #[error("answer must be an integer, got {0:?}")]
    InvalidAnswer(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;
