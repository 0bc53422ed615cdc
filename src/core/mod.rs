// Core engine exports
pub mod chat;
pub mod decisions;
pub mod exclusion;
pub mod matchmaker;
pub mod selector;

pub use chat::ChatLedger;
pub use decisions::{DecisionOutcome, DecisionRecorder};
pub use exclusion::ExclusionTracker;
pub use matchmaker::MatchDetector;
pub use selector::CandidateSelector;

use thiserror::Error;

use crate::services::StoreError;

/// Errors surfaced by the matching engine.
///
/// Exhaustion of the candidate pool is deliberately not here: it is a normal
/// terminal state reported through `NextCandidate::Exhausted`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Users are not matched")]
    NotMatched,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflicting concurrent update: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => CoreError::NotFound(what),
            StoreError::AlreadyExists(what) => CoreError::AlreadyExists(what),
            StoreError::Conflict(what) => CoreError::Conflict(what),
            other => CoreError::Store(other),
        }
    }
}
