use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

use crate::models::{ordered_pair, MatchPair, Message, Profile, User, UserId};
use crate::services::store::{ProfileStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<UserId, User>,
    profiles: BTreeMap<UserId, Profile>,
    likes: HashSet<(UserId, UserId)>,
    seen: HashSet<(UserId, UserId)>,
    matches: BTreeMap<(UserId, UserId), DateTime<Utc>>,
    messages: Vec<Message>,
    next_user_id: UserId,
    next_message_id: i64,
}

/// In-memory store for tests and local development.
///
/// A single lock guards all state, so every store operation is atomic as a
/// whole: compound updates (like + seen, reciprocity check + match insert)
/// hold the write guard for their full duration and concurrent tasks observe
/// either none or all of an operation's effects.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_user_id: 1,
                next_message_id: 1,
                ..Inner::default()
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore for MemoryStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        default_photo: &str,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;

        let duplicate = inner.users.values().any(|u| {
            u.username == username || (email.is_some() && u.email.as_deref() == email)
        });
        if duplicate {
            return Err(StoreError::AlreadyExists(format!(
                "user {} is already registered",
                username
            )));
        }

        let id = inner.next_user_id;
        inner.next_user_id += 1;

        let user = User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            email: email.map(str::to_string),
            created_at: Utc::now(),
        };

        inner.users.insert(id, user.clone());
        inner.profiles.insert(id, Profile::empty(id, default_photo));

        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        let inner = self.inner.read().await;
        inner
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let inner = self.inner.read().await;
        inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", username)))
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Profile, StoreError> {
        let inner = self.inner.read().await;
        inner
            .profiles
            .get(&user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("profile for user {}", user_id)))
    }

    async fn update_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.profiles.get_mut(&profile.user_id) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!(
                "profile for user {}",
                profile.user_id
            ))),
        }
    }

    async fn find_unseen_profile(
        &self,
        excluded: &[UserId],
    ) -> Result<Option<Profile>, StoreError> {
        let inner = self.inner.read().await;
        // BTreeMap iteration gives ascending user id, matching the
        // deterministic selection policy of the Postgres backend.
        Ok(inner
            .profiles
            .values()
            .find(|p| !excluded.contains(&p.user_id))
            .cloned())
    }

    async fn seen_ids(&self, viewer: UserId) -> Result<Vec<UserId>, StoreError> {
        let inner = self.inner.read().await;
        let mut ids: Vec<UserId> = inner
            .seen
            .iter()
            .filter(|(v, _)| *v == viewer)
            .map(|(_, t)| *t)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn has_seen(&self, viewer: UserId, target: UserId) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.seen.contains(&(viewer, target)))
    }

    async fn mark_seen(&self, viewer: UserId, target: UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.seen.insert((viewer, target));
        Ok(())
    }

    async fn apply_like(&self, actor: UserId, target: UserId) -> Result<(), StoreError> {
        // One guard scope: the like edge and the exclusion entry land
        // together.
        let mut inner = self.inner.write().await;
        inner.likes.insert((actor, target));
        inner.seen.insert((actor, target));
        Ok(())
    }

    async fn is_liked_by(&self, liker: UserId, likee: UserId) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.likes.contains(&(liker, likee)))
    }

    async fn likes_sent(&self, user: UserId) -> Result<Vec<UserId>, StoreError> {
        let inner = self.inner.read().await;
        let mut ids: Vec<UserId> = inner
            .likes
            .iter()
            .filter(|(liker, _)| *liker == user)
            .map(|(_, likee)| *likee)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn likes_received(&self, user: UserId) -> Result<Vec<UserId>, StoreError> {
        let inner = self.inner.read().await;
        let mut ids: Vec<UserId> = inner
            .likes
            .iter()
            .filter(|(_, likee)| *likee == user)
            .map(|(liker, _)| *liker)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn try_create_match(&self, a: UserId, b: UserId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;

        // Reciprocity check and insert happen under the same write guard.
        if !inner.likes.contains(&(a, b)) || !inner.likes.contains(&(b, a)) {
            return Ok(false);
        }

        let key = ordered_pair(a, b);
        if inner.matches.contains_key(&key) {
            return Ok(false);
        }

        inner.matches.insert(key, Utc::now());
        Ok(true)
    }

    async fn are_matched(&self, a: UserId, b: UserId) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.matches.contains_key(&ordered_pair(a, b)))
    }

    async fn matches_of(&self, user: UserId) -> Result<Vec<MatchPair>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .matches
            .iter()
            .filter(|((low, high), _)| *low == user || *high == user)
            .map(|((low, high), matched_at)| MatchPair {
                user_low: *low,
                user_high: *high,
                matched_at: *matched_at,
            })
            .collect())
    }

    async fn insert_message(
        &self,
        sender: UserId,
        receiver: UserId,
        body: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;

        let id = inner.next_message_id;
        inner.next_message_id += 1;

        inner.messages.push(Message {
            id,
            sender_id: sender,
            receiver_id: receiver,
            body: body.to_string(),
            sent_at,
        });

        Ok(id)
    }

    async fn messages_involving(&self, user: UserId) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.read().await;
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.sender_id == user || m.receiver_id == user)
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.sent_at, m.id));
        Ok(messages)
    }
}
