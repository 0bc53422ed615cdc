use serde::{Deserialize, Serialize};

use crate::models::domain::{Message, Profile, UserId};

/// Response for the next-candidate endpoint
///
/// `candidate` is absent exactly when `exhausted` is true: the viewer has
/// seen every eligible profile and the client renders an empty state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextCandidateResponse {
    pub candidate: Option<Profile>,
    pub exhausted: bool,
}

/// Response for the decision endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub success: bool,
    pub matched: bool,
    pub event_id: String,
}

/// Response for the matches listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub matches: Vec<Profile>,
    pub count: usize,
}

/// One chat thread with a single peer, messages ordered by timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "peerId")]
    pub peer_id: UserId,
    pub messages: Vec<Message>,
}

/// Response for the conversations listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<Conversation>,
}

/// Response after posting a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMessageResponse {
    pub success: bool,
    #[serde(rename = "messageId")]
    pub message_id: i64,
}

/// Response after registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub username: String,
}

/// Response after login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
