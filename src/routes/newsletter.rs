use axum::{extract::State, http::StatusCode, middleware, routing::post, Json, Router};

use crate::db::{newsletter, DbPool};
use crate::error::Result;
use crate::middleware::rate_limit::{rate_limit_middleware, RateLimitState};
use crate::models::{NewsletterRequest, NewsletterResponse};
use crate::services::rate_limiter::{EndpointClass, RateLimiter};
use crate::utils::validate_email;

#[derive(Clone)]
pub struct NewsletterState {
    pub db: DbPool,
}

pub fn router(db: DbPool, limiter: RateLimiter) -> Router {
    let state = NewsletterState { db };
    Router::new()
        .route("/api/newsletter", post(subscribe))
        .route_layer(middleware::from_fn_with_state(
            RateLimitState::new(limiter, EndpointClass::General),
            rate_limit_middleware,
        ))
        .with_state(state)
}

/// Iscrizione alla newsletter
#[utoipa::path(
    post,
    path = "/api/newsletter",
    request_body = NewsletterRequest,
    responses(
        (status = 201, description = "Nuova iscrizione", body = NewsletterResponse),
        (status = 200, description = "Indirizzo gia' iscritto", body = NewsletterResponse),
        (status = 400, description = "Email non valida"),
        (status = 429, description = "Troppe richieste"),
    ),
    tag = "Newsletter"
)]
pub async fn subscribe(
    State(state): State<NewsletterState>,
    Json(request): Json<NewsletterRequest>,
) -> Result<(StatusCode, Json<NewsletterResponse>)> {
    let email = validate_email(&request.email)?;

    let created = newsletter::subscribe(&state.db, &email).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(NewsletterResponse {
            subscribed: true,
            already_subscribed: !created,
        }),
    ))
}
