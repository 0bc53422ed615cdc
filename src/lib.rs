//! MatchMeet - matching and mutual-consent engine for a dating app
//!
//! The core of this library is the swipe pipeline: candidate selection with
//! per-user exclusion sets, like/dislike recording, mutual-like detection
//! forming symmetric matches, and match-gated chat.

pub mod config;
pub mod core;
pub mod identity;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    CandidateSelector, ChatLedger, CoreError, DecisionRecorder, ExclusionTracker, MatchDetector,
};
pub use crate::models::{Decision, MatchPair, Message, NextCandidate, Profile, User, UserId};
pub use crate::services::{MemoryStore, PgStore, ProfileStore, StoreError};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_library_exports() {
        // Verify that the exported engine types wire together
        let store = MemoryStore::new();
        let viewer = store
            .create_user("smoke", "hash", None, "unknown_user.png")
            .await
            .unwrap()
            .id;

        let selector = CandidateSelector::new(&store);
        assert!(selector.next_candidate(viewer).await.unwrap().is_exhausted());
    }
}
