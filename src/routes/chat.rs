use axum::{extract::State, middleware, routing::post, Json, Router};

use crate::error::Result;
use crate::middleware::rate_limit::{rate_limit_middleware, RateLimitState};
use crate::models::{ChatRequest, ChatResponse};
use crate::services::ai_chat::AiChatClient;
use crate::services::rate_limiter::{EndpointClass, RateLimiter};
use crate::utils::validate_chat_messages;

#[derive(Clone)]
pub struct ChatState {
    pub ai: AiChatClient,
}

pub fn router(ai: AiChatClient, limiter: RateLimiter) -> Router {
    let state = ChatState { ai };
    Router::new()
        .route("/api/chat", post(chat))
        .route_layer(middleware::from_fn_with_state(
            RateLimitState::new(limiter, EndpointClass::Ai),
            rate_limit_middleware,
        ))
        .with_state(state)
}

/// Conversazione con l'assistente AI
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Risposta dell'assistente", body = ChatResponse),
        (status = 400, description = "Conversazione non valida"),
        (status = 429, description = "Troppe richieste"),
        (status = 502, description = "Provider AI non disponibile"),
        (status = 503, description = "Assistente non configurato"),
    ),
    tag = "Assistente"
)]
pub async fn chat(
    State(state): State<ChatState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    validate_chat_messages(&request.messages)?;

    let reply = state.ai.complete(&request.messages).await?;

    Ok(Json(ChatResponse { reply }))
}
