use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::core::CoreError;
use crate::models::{Message, UserId};
use crate::services::ProfileStore;

/// Append-only message log between matched users.
///
/// Posting is gated on match state: a pair that is not in each other's match
/// sets gets `NotMatched` and no state change. Messages are immutable once
/// written.
pub struct ChatLedger<'a, S: ProfileStore> {
    store: &'a S,
}

impl<'a, S: ProfileStore> ChatLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Append a message. Returns the new message id.
    pub async fn post_message(
        &self,
        sender: UserId,
        receiver: UserId,
        body: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<i64, CoreError> {
        if body.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "message body must not be empty".to_string(),
            ));
        }

        self.store.get_user(receiver).await?;

        if !self.store.are_matched(sender, receiver).await? {
            return Err(CoreError::NotMatched);
        }

        let id = self
            .store
            .insert_message(sender, receiver, body, sent_at)
            .await?;

        tracing::debug!("Message {} posted: {} -> {}", id, sender, receiver);

        Ok(id)
    }

    /// All of a user's messages grouped by peer, each thread ordered by
    /// timestamp ascending. The default-on-insert grouping means a peer's
    /// first message creates the thread.
    pub async fn conversations(
        &self,
        user: UserId,
    ) -> Result<BTreeMap<UserId, Vec<Message>>, CoreError> {
        let messages = self.store.messages_involving(user).await?;

        let mut by_peer: BTreeMap<UserId, Vec<Message>> = BTreeMap::new();
        for message in messages {
            let peer = if message.sender_id == user {
                message.receiver_id
            } else {
                message.sender_id
            };
            by_peer.entry(peer).or_default().push(message);
        }

        Ok(by_peer)
    }

    /// One thread with a single peer, ordered by timestamp ascending.
    pub async fn messages_with(
        &self,
        user: UserId,
        peer: UserId,
    ) -> Result<Vec<Message>, CoreError> {
        let mut conversations = self.conversations(user).await?;
        Ok(conversations.remove(&peer).unwrap_or_default())
    }
}
