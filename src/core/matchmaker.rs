use crate::core::CoreError;
use crate::models::UserId;
use crate::services::{ProfileStore, StoreError};

/// Detects reciprocal likes and forms matches.
///
/// A match is one record per unordered pair, created the moment both
/// directed like edges exist. Formation is atomic in the store: under
/// concurrent likes from both directions exactly one match results, and no
/// asymmetric state is ever observable.
pub struct MatchDetector<'a, S: ProfileStore> {
    store: &'a S,
}

impl<'a, S: ProfileStore> MatchDetector<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Called after `a` likes `b`. Returns true when this call formed the
    /// match. Idempotent: an existing match is left untouched.
    pub async fn check_and_match(&self, a: UserId, b: UserId) -> Result<bool, CoreError> {
        Ok(self.try_detect(a, b).await?)
    }

    /// Store-level detection. Lock conflicts surface as retryable
    /// `StoreError`s so the caller can rerun the whole check.
    pub(crate) async fn try_detect(&self, a: UserId, b: UserId) -> Result<bool, StoreError> {
        // Cheap read first; the store re-verifies reciprocity under its own
        // lock scope before inserting.
        if !self.store.is_liked_by(b, a).await? {
            return Ok(false);
        }

        if self.store.are_matched(a, b).await? {
            return Ok(false);
        }

        let created = self.store.try_create_match(a, b).await?;
        if created {
            tracing::info!("Mutual like: users {} and {} matched", a, b);
        }
        Ok(created)
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
    async fn test_one_way_like_does_not_match() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        store.apply_like(a, b).await.unwrap();

        let detector = MatchDetector::new(&store);
        assert!(!detector.check_and_match(a, b).await.unwrap());
        assert!(!store.are_matched(a, b).await.unwrap());
    }

    #[tokio::test]
    async fn test_reciprocal_like_forms_single_match() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        store.apply_like(b, a).await.unwrap();
        store.apply_like(a, b).await.unwrap();

        let detector = MatchDetector::new(&store);
        assert!(detector.check_and_match(a, b).await.unwrap());
        // Replay from either side is a no-op.
        assert!(!detector.check_and_match(a, b).await.unwrap());
        assert!(!detector.check_and_match(b, a).await.unwrap());

        assert!(store.are_matched(a, b).await.unwrap());
        assert!(store.are_matched(b, a).await.unwrap());
    }
}
