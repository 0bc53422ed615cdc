use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::ChatLedger;
use crate::identity::Actor;
use crate::models::{
    Conversation, ConversationsResponse, ErrorResponse, PostMessageRequest, PostMessageResponse,
    UserId,
};
use crate::routes::{error_response, AppState};

/// Configure chat routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/chat/messages", web::post().to(post_message))
        .route("/chat/messages", web::get().to(list_conversations))
        .route("/chat/messages/{peer_id}", web::get().to(thread_with_peer));
}

/// Post a message to a matched user
///
/// POST /api/v1/chat/messages
///
/// Rejected with 403 when the pair is not matched; no state changes in that
/// case.
async fn post_message(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<PostMessageRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let ledger = ChatLedger::new(state.store.as_ref());

    match ledger
        .post_message(actor.0, req.receiver_id, &req.body, chrono::Utc::now())
        .await
    {
        Ok(message_id) => HttpResponse::Created().json(PostMessageResponse {
            success: true,
            message_id,
        }),
        Err(e) => error_response(&e),
    }
}

/// List all conversations grouped by peer
///
/// GET /api/v1/chat/messages
async fn list_conversations(state: web::Data<AppState>, actor: Actor) -> impl Responder {
    let ledger = ChatLedger::new(state.store.as_ref());

    match ledger.conversations(actor.0).await {
        Ok(threads) => {
            let conversations: Vec<Conversation> = threads
                .into_iter()
                .map(|(peer_id, messages)| Conversation { peer_id, messages })
                .collect();
            HttpResponse::Ok().json(ConversationsResponse { conversations })
        }
        Err(e) => error_response(&e),
    }
}

/// Single thread with one peer
///
/// GET /api/v1/chat/messages/{peer_id}
async fn thread_with_peer(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<UserId>,
) -> impl Responder {
    let peer_id = path.into_inner();
    let ledger = ChatLedger::new(state.store.as_ref());

    match ledger.messages_with(actor.0, peer_id).await {
        Ok(messages) => HttpResponse::Ok().json(Conversation { peer_id, messages }),
        Err(e) => error_response(&e),
    }
}
