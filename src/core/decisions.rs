use crate::core::{CoreError, MatchDetector};
use crate::models::{Decision, UserId};
use crate::services::{ProfileStore, StoreError};

/// Bounded retry budget for transient storage conflicts.
const MAX_ATTEMPTS: u32 = 3;

/// Outcome of a recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionOutcome {
    /// True when this decision completed a mutual like.
    pub matched: bool,
}

/// Records like/dislike outcomes.
///
/// A dislike only grows the actor's seen set. A like additionally writes the
/// directed edge (visible as the actor's likes_sent and the target's
/// likes_received) in the same atomic unit as the exclusion entry, then runs
/// match detection on the pair. Both operations are idempotent replays.
pub struct DecisionRecorder<'a, S: ProfileStore> {
    store: &'a S,
}

impl<'a, S: ProfileStore> DecisionRecorder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        actor: UserId,
        target: UserId,
        decision: Decision,
    ) -> Result<DecisionOutcome, CoreError> {
        match decision {
            Decision::Like => self.record_like(actor, target).await,
            Decision::Pass => self.record_dislike(actor, target).await,
        }
    }

    pub async fn record_like(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<DecisionOutcome, CoreError> {
        self.validate_pair(actor, target).await?;

        self.with_retries(|| self.store.apply_like(actor, target))
            .await?;

        tracing::debug!("Decision recorded: {} likes {}", actor, target);

        // Match formation contends on the same row locks as concurrent
        // likes, so it runs under the same retry budget.
        let detector = MatchDetector::new(self.store);
        let matched = self
            .with_retries(|| detector.try_detect(actor, target))
            .await?;

        Ok(DecisionOutcome { matched })
    }

    pub async fn record_dislike(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<DecisionOutcome, CoreError> {
        self.validate_pair(actor, target).await?;

        self.with_retries(|| self.store.mark_seen(actor, target))
            .await?;

        tracing::debug!("Decision recorded: {} passes on {}", actor, target);

        Ok(DecisionOutcome { matched: false })
    }

    /// Both endpoints must resolve, and self-decisions are rejected.
    async fn validate_pair(&self, actor: UserId, target: UserId) -> Result<(), CoreError> {
        if actor == target {
            return Err(CoreError::InvalidInput(
                "cannot record a decision on yourself".to_string(),
            ));
        }

        self.store.get_user(actor).await?;
        self.store.get_user(target).await?;
        Ok(())
    }

    /// Run a store mutation, retrying on retryable conflicts with a bounded
    /// budget. Exhausted retries surface as a transient `Conflict`.
    async fn with_retries<T, F, Fut>(&self, mut op: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        "Retryable store conflict (attempt {}/{}): {}",
                        attempt,
                        MAX_ATTEMPTS,
                        e
                    );
                }
                Err(e) if e.is_retryable() => {
                    return Err(CoreError::Conflict(format!(
                        "gave up after {} attempts: {}",
                        attempt, e
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchPair, Message, Profile, User};
    use crate::services::MemoryStore;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn seed_user<S: ProfileStore>(store: &S, name: &str) -> UserId {
        store
            .create_user(name, "hash", None, "unknown_user.png")
            .await
            .unwrap()
            .id
    }

    /// Store that fails a configured number of like writes and match inserts
    /// with a retryable conflict before delegating, mimicking lock
    /// contention under concurrent decisions.
    struct FlakyStore {
        inner: MemoryStore,
        like_failures: AtomicU32,
        match_failures: AtomicU32,
    }

    impl FlakyStore {
        fn new(like_failures: u32, match_failures: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                like_failures: AtomicU32::new(like_failures),
                match_failures: AtomicU32::new(match_failures),
            }
        }

        fn take_failure(counter: &AtomicU32) -> bool {
            counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    impl ProfileStore for FlakyStore {
        async fn create_user(
            &self,
            username: &str,
            password_hash: &str,
            email: Option<&str>,
            default_photo: &str,
        ) -> Result<User, StoreError> {
            self.inner
                .create_user(username, password_hash, email, default_photo)
                .await
        }

        async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
            self.inner.get_user(id).await
        }

        async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError> {
            self.inner.get_user_by_username(username).await
        }

        async fn get_profile(&self, user_id: UserId) -> Result<Profile, StoreError> {
            self.inner.get_profile(user_id).await
        }

        async fn update_profile(&self, profile: &Profile) -> Result<(), StoreError> {
            self.inner.update_profile(profile).await
        }

        async fn find_unseen_profile(
            &self,
            excluded: &[UserId],
        ) -> Result<Option<Profile>, StoreError> {
            self.inner.find_unseen_profile(excluded).await
        }

        async fn seen_ids(&self, viewer: UserId) -> Result<Vec<UserId>, StoreError> {
            self.inner.seen_ids(viewer).await
        }

        async fn has_seen(&self, viewer: UserId, target: UserId) -> Result<bool, StoreError> {
            self.inner.has_seen(viewer, target).await
        }

        async fn mark_seen(&self, viewer: UserId, target: UserId) -> Result<(), StoreError> {
            self.inner.mark_seen(viewer, target).await
        }

        async fn apply_like(&self, actor: UserId, target: UserId) -> Result<(), StoreError> {
            if Self::take_failure(&self.like_failures) {
                return Err(StoreError::Conflict("lock contention".to_string()));
            }
            self.inner.apply_like(actor, target).await
        }

        async fn is_liked_by(&self, liker: UserId, likee: UserId) -> Result<bool, StoreError> {
            self.inner.is_liked_by(liker, likee).await
        }

        async fn likes_sent(&self, user: UserId) -> Result<Vec<UserId>, StoreError> {
            self.inner.likes_sent(user).await
        }

        async fn likes_received(&self, user: UserId) -> Result<Vec<UserId>, StoreError> {
            self.inner.likes_received(user).await
        }

        async fn try_create_match(&self, a: UserId, b: UserId) -> Result<bool, StoreError> {
            if Self::take_failure(&self.match_failures) {
                return Err(StoreError::Conflict("lock contention".to_string()));
            }
            self.inner.try_create_match(a, b).await
        }

        async fn are_matched(&self, a: UserId, b: UserId) -> Result<bool, StoreError> {
            self.inner.are_matched(a, b).await
        }

        async fn matches_of(&self, user: UserId) -> Result<Vec<MatchPair>, StoreError> {
            self.inner.matches_of(user).await
        }

        async fn insert_message(
            &self,
            sender: UserId,
            receiver: UserId,
            body: &str,
            sent_at: DateTime<Utc>,
        ) -> Result<i64, StoreError> {
            self.inner.insert_message(sender, receiver, body, sent_at).await
        }

        async fn messages_involving(&self, user: UserId) -> Result<Vec<Message>, StoreError> {
            self.inner.messages_involving(user).await
        }
    }

    #[tokio::test]
    async fn test_dislike_only_grows_seen_set() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let recorder = DecisionRecorder::new(&store);
        let outcome = recorder.record(a, b, Decision::Pass).await.unwrap();

        assert!(!outcome.matched);
        assert!(store.has_seen(a, b).await.unwrap());
        assert!(store.likes_sent(a).await.unwrap().is_empty());
        assert!(store.likes_received(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_like_writes_edge_and_exclusion_together() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let recorder = DecisionRecorder::new(&store);
        let outcome = recorder.record(a, b, Decision::Like).await.unwrap();

        assert!(!outcome.matched);
        assert_eq!(store.likes_sent(a).await.unwrap(), vec![b]);
        assert_eq!(store.likes_received(b).await.unwrap(), vec![a]);
        assert!(store.has_seen(a, b).await.unwrap());
    }

    #[tokio::test]
    async fn test_decision_on_unknown_target_is_not_found() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a").await;

        let recorder = DecisionRecorder::new(&store);
        let err = recorder.record(a, 999, Decision::Like).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_self_decision_is_invalid() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a").await;

        let recorder = DecisionRecorder::new(&store);
        let err = recorder.record(a, a, Decision::Pass).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_reciprocal_like_reports_match() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let recorder = DecisionRecorder::new(&store);
        assert!(!recorder.record(a, b, Decision::Like).await.unwrap().matched);
        assert!(recorder.record(b, a, Decision::Like).await.unwrap().matched);

        // Replaying the like neither duplicates edges nor re-forms the match.
        assert!(!recorder.record(b, a, Decision::Like).await.unwrap().matched);
        assert_eq!(store.likes_sent(b).await.unwrap(), vec![a]);
        assert_eq!(store.matches_of(a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_like_retries_past_transient_conflicts() {
        // Two conflicts, then the write lands on the final attempt.
        let store = FlakyStore::new(MAX_ATTEMPTS - 1, 0);
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let recorder = DecisionRecorder::new(&store);
        let outcome = recorder.record(a, b, Decision::Like).await.unwrap();

        assert!(!outcome.matched);
        assert_eq!(store.likes_sent(a).await.unwrap(), vec![b]);
        assert!(store.has_seen(a, b).await.unwrap());
    }

    #[tokio::test]
    async fn test_like_conflict_budget_exhaustion() {
        let store = FlakyStore::new(MAX_ATTEMPTS, 0);
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let recorder = DecisionRecorder::new(&store);
        let err = recorder.record(a, b, Decision::Like).await.unwrap_err();

        assert!(matches!(err, CoreError::Conflict(_)));
        assert!(store.likes_sent(a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_match_formation_retries_past_transient_conflicts() {
        let store = FlakyStore::new(0, MAX_ATTEMPTS - 1);
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let recorder = DecisionRecorder::new(&store);
        assert!(!recorder.record(a, b, Decision::Like).await.unwrap().matched);

        // The reciprocal like contends on the match insert twice before it
        // lands; the decision still reports the match.
        let outcome = recorder.record(b, a, Decision::Like).await.unwrap();
        assert!(outcome.matched);
        assert_eq!(store.matches_of(a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_match_formation_conflict_budget_exhaustion() {
        let store = FlakyStore::new(0, MAX_ATTEMPTS);
        let a = seed_user(&store, "a").await;
        let b = seed_user(&store, "b").await;

        let recorder = DecisionRecorder::new(&store);
        assert!(!recorder.record(a, b, Decision::Like).await.unwrap().matched);

        let err = recorder.record(b, a, Decision::Like).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        // The like edge committed; only the match record is still absent.
        assert_eq!(store.likes_sent(b).await.unwrap(), vec![a]);
        assert!(!store.are_matched(a, b).await.unwrap());
    }
}
