// Route exports
pub mod accounts;
pub mod chat;
pub mod feed;

use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::core::CoreError;
use crate::models::{ErrorResponse, HealthResponse};
use crate::services::{CacheManager, PgStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PgStore>,
    pub cache: Arc<CacheManager>,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub default_photo: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(accounts::configure)
            .configure(feed::configure)
            .configure(chat::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Map an engine error onto the wire taxonomy.
pub(crate) fn error_response(err: &CoreError) -> HttpResponse {
    let (status, label) = match err {
        CoreError::NotFound(_) => (actix_web::http::StatusCode::NOT_FOUND, "not_found"),
        CoreError::AlreadyExists(_) => (actix_web::http::StatusCode::CONFLICT, "already_exists"),
        CoreError::NotMatched => (actix_web::http::StatusCode::FORBIDDEN, "not_matched"),
        CoreError::InvalidInput(_) => (actix_web::http::StatusCode::BAD_REQUEST, "invalid_input"),
        CoreError::Conflict(_) => (
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
            "transient_conflict",
        ),
        CoreError::Store(_) => (
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
        ),
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    }

    HttpResponse::build(status).json(ErrorResponse {
        error: label.to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}
