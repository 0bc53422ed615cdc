use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::future::{ready, Ready};
use thiserror::Error;

use crate::models::{ErrorResponse, UserId};
use crate::routes::AppState;

/// The authenticated actor behind a request.
///
/// Extracted from a bearer token on every call, so the engine always
/// receives an explicit, request-scoped actor id instead of reading ambient
/// session state. Token validation is the whole of the identity collaborator
/// here; issuing happens at login.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub UserId);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: "unauthorized".to_string(),
            message: self.to_string(),
            status_code: self.status_code().as_u16(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: String,
    /// Expiration (unix timestamp).
    exp: usize,
    /// Issued-at (unix timestamp).
    iat: usize,
}

/// Create a signed token for a logged-in user.
pub fn issue_token(secret: &str, user_id: UserId, ttl_secs: u64) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp().max(0) as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + ttl_secs as usize,
        iat: now,
    };

    Ok(encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Verify a token and return the user id it was issued for.
pub fn verify_token(secret: &str, token: &str) -> Result<UserId, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::InvalidToken)?;

    data.claims
        .sub
        .parse::<UserId>()
        .map_err(|_| AuthError::InvalidToken)
}

/// Password digest for storage and comparison.
///
/// Credential handling is deliberately minimal; the engine only ever sees an
/// already-authenticated actor id.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}

impl FromRequest for Actor {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = (|| {
            let state = req
                .app_data::<actix_web::web::Data<AppState>>()
                .ok_or(AuthError::InvalidToken)?;

            let header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .ok_or(AuthError::MissingToken)?;

            let token = header
                .strip_prefix("Bearer ")
                .ok_or(AuthError::MissingToken)?;

            verify_token(&state.jwt_secret, token).map(Actor)
        })();

        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = issue_token("secret", 42, 3600).unwrap();
        assert_eq!(verify_token("secret", &token).unwrap(), 42);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("secret", 42, 3600).unwrap();
        assert!(matches!(
            verify_token("other", &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_password_digest_round_trip() {
        let hash = hash_password("hunter2-hunter2");
        assert!(verify_password("hunter2-hunter2", &hash));
        assert!(!verify_password("wrong", &hash));
    }
}
