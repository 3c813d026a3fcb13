use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::middleware::rate_limit::apply_rate_limit_headers;
use crate::services::rate_limiter::RateLimitDecision;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Richiesta non valida: {0}")]
    BadRequest(String),

    #[error("Risorsa non trovata: {0}")]
    NotFound(String),

    #[error("Troppe richieste. Riprova tra poco.")]
    RateLimited(RateLimitDecision),

    #[error("Errore servizio esterno: {0}")]
    Upstream(String),

    #[error("Servizio non disponibile: {0}")]
    ServiceUnavailable(String),

    #[error("Errore database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Errore interno: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // I dettagli di upstream e database restano nei log, al client va un messaggio generico
        let (status, error_message) = match &self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AppError::Upstream(detail) => {
                tracing::error!("Errore servizio esterno: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    "Servizio esterno non disponibile, riprova piu' tardi".to_string(),
                )
            }
            AppError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::Database(e) => {
                tracing::error!("Errore database: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Errore interno".to_string(),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Errore interno: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Errore interno".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        let mut response = (status, body).into_response();

        if let AppError::RateLimited(decision) = &self {
            apply_rate_limit_headers(response.headers_mut(), decision);
            let retry_after = decision.retry_after_secs().to_string();
            if let Ok(value) = HeaderValue::from_str(&retry_after) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
