use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::error::AppError;
use crate::services::rate_limiter::{EndpointClass, RateLimitDecision, RateLimitPolicy, RateLimiter};
use crate::utils::client_identifier;

pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// Stato del middleware: store condiviso e policy della classe di endpoint
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: RateLimiter,
    pub class: EndpointClass,
    pub policy: RateLimitPolicy,
}

impl RateLimitState {
    pub fn new(limiter: RateLimiter, class: EndpointClass) -> Self {
        Self {
            limiter,
            class,
            policy: class.policy(),
        }
    }
}

/// Aggiunge gli header `X-RateLimit-*` alla risposta
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(HEADER_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(HEADER_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(HEADER_RESET, HeaderValue::from(decision.reset_unix()));
}

/// Middleware per rate limiting a finestra fissa.
///
/// Le richieste negate ricevono 429 senza arrivare all'handler; il client
/// deve riprovare dopo `X-RateLimit-Reset`.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identifier = client_identifier(request.headers(), remote);

    let decision = state.limiter.check(&identifier, &state.policy);

    if !decision.allowed {
        tracing::warn!(
            "Rate limit superato: classe={} path={} reset={}",
            state.class,
            request.uri().path(),
            decision.reset_unix()
        );
        return Err(AppError::RateLimited(decision));
    }

    let mut response = next.run(request).await;
    apply_rate_limit_headers(response.headers_mut(), &decision);
    Ok(response)
}
