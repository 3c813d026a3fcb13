use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};

use crate::db::{sessions, DbPool};
use crate::error::Result;
use crate::middleware::access_gate::current_session;
use crate::middleware::rate_limit::{rate_limit_middleware, RateLimitState};
use crate::models::SessionResponse;
use crate::services::rate_limiter::{EndpointClass, RateLimiter};
use crate::services::roles::RoleResolver;
use crate::utils::session_token;

/// State per le route di autenticazione
#[derive(Clone)]
pub struct AuthRouteState {
    pub db: DbPool,
    pub roles: RoleResolver,
}

/// La lettura della sessione e' una semplice verifica di stato (policy
/// `general`); `auth` resta per le operazioni sulle credenziali.
pub fn router(db: DbPool, roles: RoleResolver, limiter: RateLimiter) -> Router {
    let state = AuthRouteState { db, roles };

    let status = Router::new()
        .route("/api/auth/session", get(get_session))
        .route_layer(middleware::from_fn_with_state(
            RateLimitState::new(limiter.clone(), EndpointClass::General),
            rate_limit_middleware,
        ));

    let credentials = Router::new()
        .route("/api/auth/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            RateLimitState::new(limiter, EndpointClass::Auth),
            rate_limit_middleware,
        ));

    status.merge(credentials).with_state(state)
}

/// Stato della sessione corrente
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Sessione corrente (anche se assente)", body = SessionResponse),
        (status = 429, description = "Troppe richieste"),
    ),
    tag = "Auth"
)]
pub async fn get_session(
    State(state): State<AuthRouteState>,
    headers: HeaderMap,
) -> Json<SessionResponse> {
    let Some(session) = current_session(&state.db, session_token(&headers)).await else {
        return Json(SessionResponse {
            authenticated: false,
            user_id: None,
            role: None,
            expires_at: None,
        });
    };

    // Un lookup fallito non rompe la risposta: ruolo sconosciuto
    let role = match state.roles.resolve(&session.user_id).await {
        Ok(role) => Some(role),
        Err(e) => {
            tracing::warn!("Ruolo non risolvibile per {}: {}", session.user_id, e);
            None
        }
    };

    Json(SessionResponse {
        authenticated: true,
        user_id: Some(session.user_id),
        role,
        expires_at: Some(session.expires_at),
    })
}

/// Chiude la sessione corrente
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Sessione chiusa (o gia' assente)"),
        (status = 429, description = "Troppe richieste"),
    ),
    tag = "Auth"
)]
pub async fn logout(State(state): State<AuthRouteState>, headers: HeaderMap) -> Result<StatusCode> {
    let Some(token) = session_token(&headers) else {
        return Ok(StatusCode::NO_CONTENT);
    };

    if let Some(session) = current_session(&state.db, Some(token.clone())).await {
        state.roles.invalidate(&session.user_id);
        tracing::info!("Logout utente {}", session.user_id);
    }

    sessions::delete_session(&state.db, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}
