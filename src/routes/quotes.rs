use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    routing::post,
    Json, Router,
};

use crate::db::{quotes, DbPool};
use crate::error::Result;
use crate::middleware::access_gate::current_session;
use crate::middleware::rate_limit::{rate_limit_middleware, RateLimitState};
use crate::models::{QuoteCreatedResponse, QuoteRequest};
use crate::services::rate_limiter::{EndpointClass, RateLimiter};
use crate::utils::{session_token, validate_quote};

#[derive(Clone)]
pub struct QuotesState {
    pub db: DbPool,
}

pub fn router(db: DbPool, limiter: RateLimiter) -> Router {
    let state = QuotesState { db };
    Router::new()
        .route("/api/quotes", post(submit_quote))
        .route_layer(middleware::from_fn_with_state(
            RateLimitState::new(limiter, EndpointClass::Quotes),
            rate_limit_middleware,
        ))
        .with_state(state)
}

/// Invia una richiesta di preventivo
///
/// Pubblica; se c'e' una sessione valida la richiesta viene legata all'utente.
#[utoipa::path(
    post,
    path = "/api/quotes",
    request_body = QuoteRequest,
    responses(
        (status = 201, description = "Richiesta registrata", body = QuoteCreatedResponse),
        (status = 400, description = "Dati non validi"),
        (status = 429, description = "Troppe richieste"),
    ),
    tag = "Preventivi"
)]
pub async fn submit_quote(
    State(state): State<QuotesState>,
    headers: HeaderMap,
    Json(request): Json<QuoteRequest>,
) -> Result<(StatusCode, Json<QuoteCreatedResponse>)> {
    let user_id = current_session(&state.db, session_token(&headers))
        .await
        .map(|s| s.user_id);

    let quote = validate_quote(&request, user_id)?;
    let id = quotes::create_quote(&state.db, &quote).await?;

    tracing::info!("Nuova richiesta preventivo {} (CAP {})", id, quote.zip_code);

    Ok((
        StatusCode::CREATED,
        Json(QuoteCreatedResponse {
            id,
            message: "Richiesta ricevuta, gli installatori della tua zona ti contatteranno".to_string(),
        }),
    ))
}
