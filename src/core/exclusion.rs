use crate::core::CoreError;
use crate::models::UserId;
use crate::services::ProfileStore;

/// Per-user exclusion bookkeeping.
///
/// Maintains the set of profiles a viewer must never be shown again. The set
/// only grows; `mark_seen` is an idempotent add-if-absent on the store. The
/// viewer's own id is excluded implicitly by `exclusion_set`, never stored.
pub struct ExclusionTracker<'a, S: ProfileStore> {
    store: &'a S,
}

impl<'a, S: ProfileStore> ExclusionTracker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn has_seen(&self, viewer: UserId, candidate: UserId) -> Result<bool, CoreError> {
        Ok(self.store.has_seen(viewer, candidate).await?)
    }

    /// Append `candidate` to the viewer's seen set. No-op when already
    /// present.
    pub async fn mark_seen(&self, viewer: UserId, candidate: UserId) -> Result<(), CoreError> {
        self.store.mark_seen(viewer, candidate).await?;
        Ok(())
    }

    /// The full exclusion set for candidate selection: everything the viewer
    /// has seen, plus the viewer themselves.
    pub async fn exclusion_set(&self, viewer: UserId) -> Result<Vec<UserId>, CoreError> {
        let mut excluded = self.store.seen_ids(viewer).await?;
        if !excluded.contains(&viewer) {
            excluded.push(viewer);
        }
        Ok(excluded)
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
    async fn test_mark_seen_is_idempotent() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let tracker = ExclusionTracker::new(&store);
        tracker.mark_seen(a, b).await.unwrap();
        tracker.mark_seen(a, b).await.unwrap();

        assert!(tracker.has_seen(a, b).await.unwrap());
        let seen = store.seen_ids(a).await.unwrap();
        assert_eq!(seen, vec![b]);
    }

    #[tokio::test]
    async fn test_exclusion_set_always_contains_self() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let tracker = ExclusionTracker::new(&store);
        let fresh = tracker.exclusion_set(a).await.unwrap();
        assert_eq!(fresh, vec![a]);

        tracker.mark_seen(a, b).await.unwrap();
        let mut excluded = tracker.exclusion_set(a).await.unwrap();
        excluded.sort_unstable();
        assert_eq!(excluded, vec![a, b]);
    }
}
