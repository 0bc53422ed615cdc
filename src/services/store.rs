use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{MatchPair, Message, Profile, User, UserId};

/// Errors surfaced by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether the caller may retry the operation.
    ///
    /// Covers lost-update conflicts plus Postgres serialization failures
    /// (40001) and deadlock aborts (40P01).
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Conflict(_) => true,
            StoreError::Database(sqlx::Error::Database(db)) => {
                matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
            }
            _ => false,
        }
    }
}

/// Storage contract the matching engine depends on.
///
/// Methods are operation-granular so each backend can make the compound
/// updates atomic: `apply_like` commits the like edge and the seen entry as
/// one unit, and `try_create_match` verifies reciprocity and inserts the
/// match under a single lock scope or transaction. Set-valued state is held
/// in join tables (or equivalent keyed sets), so every append is an
/// add-if-absent primitive rather than a read-modify-write of an array.
pub trait ProfileStore {
    /// Create a user plus an empty profile. Fails with `AlreadyExists` on a
    /// duplicate username or email.
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        default_photo: &str,
    ) -> impl std::future::Future<Output = Result<User, StoreError>> + Send;

    fn get_user(&self, id: UserId)
        -> impl std::future::Future<Output = Result<User, StoreError>> + Send;

    fn get_user_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<User, StoreError>> + Send;

    fn get_profile(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<Profile, StoreError>> + Send;

    /// Overwrite the profile row for `profile.user_id`.
    fn update_profile(
        &self,
        profile: &Profile,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// First profile whose owner is not in `excluded`, by ascending user id.
    fn find_unseen_profile(
        &self,
        excluded: &[UserId],
    ) -> impl std::future::Future<Output = Result<Option<Profile>, StoreError>> + Send;

    fn seen_ids(
        &self,
        viewer: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<UserId>, StoreError>> + Send;

    fn has_seen(
        &self,
        viewer: UserId,
        target: UserId,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    /// Idempotent append of `target` to the viewer's exclusion set.
    fn mark_seen(
        &self,
        viewer: UserId,
        target: UserId,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Record a like: inserts the directed edge and the seen entry as one
    /// atomic unit. Idempotent on re-likes.
    fn apply_like(
        &self,
        actor: UserId,
        target: UserId,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Whether `liker` has an outstanding like edge towards `likee`.
    fn is_liked_by(
        &self,
        liker: UserId,
        likee: UserId,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    fn likes_sent(
        &self,
        user: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<UserId>, StoreError>> + Send;

    fn likes_received(
        &self,
        user: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<UserId>, StoreError>> + Send;

    /// Atomically verify that both like edges exist and insert the unordered
    /// match pair if absent. Returns true only when this call created the
    /// match. Idempotent; safe under concurrent mutual likes.
    fn try_create_match(
        &self,
        a: UserId,
        b: UserId,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    fn are_matched(
        &self,
        a: UserId,
        b: UserId,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    fn matches_of(
        &self,
        user: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<MatchPair>, StoreError>> + Send;

    /// Append-only message insert. Returns the new message id.
    fn insert_message(
        &self,
        sender: UserId,
        receiver: UserId,
        body: &str,
        sent_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<i64, StoreError>> + Send;

    /// All messages where `user` is sender or receiver, ordered by timestamp
    /// ascending (message id as tiebreak).
    fn messages_involving(
        &self,
        user: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, StoreError>> + Send;
}
