use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::CoreError;
use crate::identity::{hash_password, issue_token, verify_password, Actor};
use crate::models::{
    ErrorResponse, LoginRequest, LoginResponse, Profile, RegisterRequest, RegisterResponse,
    UpdateProfileRequest, UserId,
};
use crate::routes::{error_response, AppState};
use crate::services::{CacheKey, ProfileStore};

/// Configure account and profile routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/accounts/register", web::post().to(register))
        .route("/accounts/login", web::post().to(login))
        .route("/profiles/me", web::get().to(get_own_profile))
        .route("/profiles/me", web::put().to(update_own_profile))
        .route("/profiles/{user_id}", web::get().to(get_profile));
}

/// Register a new account
///
/// POST /api/v1/accounts/register
///
/// Creates the user and an empty profile carrying the default photo
/// reference. A duplicate username or email is a 409, not a fatal error.
async fn register(state: web::Data<AppState>, req: web::Json<RegisterRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let result = state
        .store
        .create_user(
            &req.username,
            &hash_password(&req.password),
            req.email.as_deref(),
            &state.default_photo,
        )
        .await;

    match result {
        Ok(user) => {
            tracing::info!("Registered user {} ({})", user.id, user.username);
            HttpResponse::Created().json(RegisterResponse {
                user_id: user.id,
                username: user.username,
            })
        }
        Err(e) => error_response(&CoreError::from(e)),
    }
}

/// Log in and obtain a bearer token
///
/// POST /api/v1/accounts/login
async fn login(state: web::Data<AppState>, req: web::Json<LoginRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    // Unknown username and wrong password collapse into one response.
    let invalid = || {
        HttpResponse::Unauthorized().json(ErrorResponse {
            error: "invalid_credentials".to_string(),
            message: "Incorrect username or password".to_string(),
            status_code: 401,
        })
    };

    let user = match state.store.get_user_by_username(&req.username).await {
        Ok(user) => user,
        Err(crate::services::StoreError::NotFound(_)) => return invalid(),
        Err(e) => return error_response(&CoreError::from(e)),
    };

    if !verify_password(&req.password, &user.password_hash) {
        return invalid();
    }

    match issue_token(&state.jwt_secret, user.id, state.token_ttl_secs) {
        Ok(token) => HttpResponse::Ok().json(LoginResponse {
            token,
            user_id: user.id,
        }),
        Err(e) => {
            tracing::error!("Token issuance failed for user {}: {}", user.id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "token_error".to_string(),
                message: "Failed to issue token".to_string(),
                status_code: 500,
            })
        }
    }
}

/// Get the caller's own profile
///
/// GET /api/v1/profiles/me
async fn get_own_profile(state: web::Data<AppState>, actor: Actor) -> impl Responder {
    fetch_profile(&state, actor.0).await
}

/// Get another user's profile (discovery view)
///
/// GET /api/v1/profiles/{user_id}
async fn get_profile(
    state: web::Data<AppState>,
    _actor: Actor,
    path: web::Path<UserId>,
) -> impl Responder {
    fetch_profile(&state, path.into_inner()).await
}

async fn fetch_profile(state: &AppState, user_id: UserId) -> HttpResponse {
    let cache_key = CacheKey::profile(user_id);
    if let Ok(profile) = state.cache.get::<Profile>(&cache_key).await {
        return HttpResponse::Ok().json(profile);
    }

    match state.store.get_profile(user_id).await {
        Ok(profile) => {
            if let Err(e) = state.cache.set(&cache_key, &profile).await {
                tracing::warn!("Failed to cache profile {}: {}", user_id, e);
            }
            HttpResponse::Ok().json(profile)
        }
        Err(e) => error_response(&CoreError::from(e)),
    }
}

/// Update the caller's own profile
///
/// PUT /api/v1/profiles/me
///
/// Absent fields keep their current value.
async fn update_own_profile(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let mut profile = match state.store.get_profile(actor.0).await {
        Ok(profile) => profile,
        Err(e) => return error_response(&CoreError::from(e)),
    };

    let req = req.into_inner();
    if req.first_name.is_some() {
        profile.first_name = req.first_name;
    }
    if req.last_name.is_some() {
        profile.last_name = req.last_name;
    }
    if req.birthday.is_some() {
        profile.birthday = req.birthday;
    }
    if req.gender.is_some() {
        profile.gender = req.gender;
    }
    if req.description.is_some() {
        profile.description = req.description;
    }
    if let Some(interests) = req.interests {
        profile.interests = interests;
    }
    if req.photo.is_some() {
        profile.photo = req.photo;
    }

    match state.store.update_profile(&profile).await {
        Ok(()) => {
            if let Err(e) = state.cache.delete(&CacheKey::profile(actor.0)).await {
                tracing::warn!("Failed to invalidate profile cache: {}", e);
            }
            HttpResponse::Ok().json(profile)
        }
        Err(e) => error_response(&CoreError::from(e)),
    }
}
