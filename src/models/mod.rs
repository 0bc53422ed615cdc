// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ordered_pair, Decision, MatchPair, Message, NextCandidate, Profile, User, UserId,
};
pub use requests::{
    DecisionRequest, LoginRequest, PostMessageRequest, RegisterRequest, UpdateProfileRequest,
};
pub use responses::{
    Conversation, ConversationsResponse, DecisionResponse, ErrorResponse, HealthResponse,
    LoginResponse, MatchesResponse, NextCandidateResponse, PostMessageResponse, RegisterResponse,
};
