//! Adaptive mental-arithmetic practice.
//!
//! [`practice`] weights the strategy catalog against a learner's history and
//! synthesizes problems that exercise the chosen strategy. [`session`] runs a
//! timed batch of those problems and folds the outcomes back into the
//! profile held by a [`store::ProfileStore`].

pub mod config;
pub mod logging;
pub mod practice;
pub mod session;
pub mod store;

pub use practice::{PracticeEngine, Problem, StrategyId, UserPreferences};
pub use session::{SessionController, SessionError};
pub use store::{JsonFileStore, MemoryStore, ProfileStore, StoreError};
