use crate::core::{CoreError, ExclusionTracker};
use crate::models::{NextCandidate, UserId};
use crate::services::ProfileStore;

/// Picks the next profile to present to a viewer.
///
/// Selection policy: first eligible profile by ascending user id. The policy
/// is deliberately deterministic; what matters is the exclusion invariant,
/// which must hold exactly: never the viewer's own profile, never an id the
/// viewer has already seen.
pub struct CandidateSelector<'a, S: ProfileStore> {
    store: &'a S,
}

impl<'a, S: ProfileStore> CandidateSelector<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Next eligible profile for `viewer`, or `Exhausted` when none remains.
    pub async fn next_candidate(&self, viewer: UserId) -> Result<NextCandidate, CoreError> {
        // Unknown viewers are an error, not an empty feed.
        self.store.get_user(viewer).await?;

        let excluded = ExclusionTracker::new(self.store)
            .exclusion_set(viewer)
            .await?;

        match self.store.find_unseen_profile(&excluded).await? {
            Some(profile) => {
                tracing::debug!(
                    "Selected candidate {} for viewer {} ({} excluded)",
                    profile.user_id,
                    viewer,
                    excluded.len()
                );
                Ok(NextCandidate::Profile(profile))
            }
            None => {
                tracing::debug!("Candidate pool exhausted for viewer {}", viewer);
                Ok(NextCandidate::Exhausted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;

    async fn seed_user(store: &MemoryStore, name: &str) -> UserId {
        store
            .create_user(name, "hash", None, "unknown_user.png")
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_never_returns_self() {
        let store = MemoryStore::new();
        let only = seed_user(&store, "solo").await;

        let selector = CandidateSelector::new(&store);
        let result = selector.next_candidate(only).await.unwrap();
        assert!(result.is_exhausted());
    }

    #[tokio::test]
    async fn test_ascending_id_policy() {
        let store = MemoryStore::new();
        let viewer = seed_user(&store, "viewer").await;
        let first = seed_user(&store, "first").await;
        let _second = seed_user(&store, "second").await;

        let selector = CandidateSelector::new(&store);
        match selector.next_candidate(viewer).await.unwrap() {
            NextCandidate::Profile(p) => assert_eq!(p.user_id, first),
            NextCandidate::Exhausted => panic!("expected a candidate"),
        }
    }

    #[tokio::test]
    async fn test_seen_profiles_are_skipped() {
        let store = MemoryStore::new();
        let viewer = seed_user(&store, "viewer").await;
        let first = seed_user(&store, "first").await;
        let second = seed_user(&store, "second").await;

        store.mark_seen(viewer, first).await.unwrap();

        let selector = CandidateSelector::new(&store);
        match selector.next_candidate(viewer).await.unwrap() {
            NextCandidate::Profile(p) => assert_eq!(p.user_id, second),
            NextCandidate::Exhausted => panic!("expected a candidate"),
        }
    }

    #[tokio::test]
    async fn test_unknown_viewer_is_not_found() {
        let store = MemoryStore::new();
        let selector = CandidateSelector::new(&store);
        let err = selector.next_candidate(999).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
