use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{Decision, UserId};

/// Request to register a new account
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
}

/// Request to log in and obtain a token
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request to update the caller's own profile
///
/// Absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 64))]
    #[serde(alias = "first_name", rename = "firstName", default)]
    pub first_name: Option<String>,
    #[validate(length(max = 64))]
    #[serde(alias = "last_name", rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub photo: Option<String>,
}

/// Request to record a swipe decision on a candidate
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DecisionRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "target_user_id", rename = "targetUserId")]
    pub target_user_id: UserId,
    pub decision: Decision,
}

/// Request to post a chat message to a matched user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PostMessageRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "receiver_id", rename = "receiverId")]
    pub receiver_id: UserId,
    #[validate(length(min = 1, max = 4096))]
    pub body: String,
}
