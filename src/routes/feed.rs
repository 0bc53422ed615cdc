use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::{CandidateSelector, DecisionRecorder};
use crate::identity::Actor;
use crate::models::{
    DecisionRequest, DecisionResponse, ErrorResponse, MatchesResponse, NextCandidate,
    NextCandidateResponse, Profile,
};
use crate::routes::{error_response, AppState};
use crate::services::{CacheKey, ProfileStore};

/// Configure discovery feed and match listing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/feed/next", web::get().to(next_candidate))
        .route("/feed/decision", web::post().to(record_decision))
        .route("/matches", web::get().to(list_matches));
}

/// Next candidate endpoint
///
/// GET /api/v1/feed/next
///
/// Returns the next profile to present, or an exhausted marker once the
/// caller has seen every eligible profile. Never cached: the exclusion set
/// must always be current.
async fn next_candidate(state: web::Data<AppState>, actor: Actor) -> impl Responder {
    let selector = CandidateSelector::new(state.store.as_ref());

    match selector.next_candidate(actor.0).await {
        Ok(NextCandidate::Profile(profile)) => HttpResponse::Ok().json(NextCandidateResponse {
            candidate: Some(profile),
            exhausted: false,
        }),
        Ok(NextCandidate::Exhausted) => HttpResponse::Ok().json(NextCandidateResponse {
            candidate: None,
            exhausted: true,
        }),
        Err(e) => error_response(&e),
    }
}

/// Record decision endpoint
///
/// POST /api/v1/feed/decision
///
/// Request body:
/// ```json
/// {
///   "targetUserId": 42,
///   "decision": "like|pass"
/// }
/// ```
async fn record_decision(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<DecisionRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let recorder = DecisionRecorder::new(state.store.as_ref());

    match recorder.record(actor.0, req.target_user_id, req.decision).await {
        Ok(outcome) => {
            if outcome.matched {
                // Both users' cached match lists are stale now.
                for user in [actor.0, req.target_user_id] {
                    if let Err(e) = state.cache.delete(&CacheKey::matches(user)).await {
                        tracing::warn!("Failed to invalidate match cache for {}: {}", user, e);
                    }
                }
            }

            HttpResponse::Ok().json(DecisionResponse {
                success: true,
                matched: outcome.matched,
                event_id: uuid::Uuid::new_v4().to_string(),
            })
        }
        Err(e) => error_response(&e),
    }
}

/// List matches endpoint
///
/// GET /api/v1/matches
///
/// Returns profile cards for everyone the caller has matched with.
async fn list_matches(state: web::Data<AppState>, actor: Actor) -> impl Responder {
    let cache_key = CacheKey::matches(actor.0);
    if let Ok(cached) = state.cache.get::<Vec<Profile>>(&cache_key).await {
        let count = cached.len();
        return HttpResponse::Ok().json(MatchesResponse {
            matches: cached,
            count,
        });
    }

    let pairs = match state.store.matches_of(actor.0).await {
        Ok(pairs) => pairs,
        Err(e) => return error_response(&crate::core::CoreError::from(e)),
    };

    let mut profiles = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        let Some(peer) = pair.peer_of(actor.0) else {
            continue;
        };
        match state.store.get_profile(peer).await {
            Ok(profile) => profiles.push(profile),
            Err(e) => {
                tracing::warn!("Skipping matched peer {} without profile: {}", peer, e);
            }
        }
    }

    if let Err(e) = state.cache.set(&cache_key, &profiles).await {
        tracing::warn!("Failed to cache match list for {}: {}", actor.0, e);
    }

    let count = profiles.len();
    HttpResponse::Ok().json(MatchesResponse {
        matches: profiles,
        count,
    })
}
