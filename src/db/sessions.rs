//! Sessioni emesse dal backend di autenticazione.
//!
//! Il servizio le legge e le chiude al logout; l'emissione qui sotto serve
//! solo ai test.

use chrono::{DateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};

use super::DbPool;
use crate::models::Session;

/// Genera un token di sessione casuale
#[cfg(test)]
pub(crate) fn generate_session_token() -> String {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let token_bytes: [u8; 32] = rng.gen();
    format!(
        "sq_{}",
        base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, token_bytes)
    )
}

/// Hash di un token di sessione
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Registra una nuova sessione, ritorna il token in chiaro
#[cfg(test)]
pub(crate) async fn create_session(
    pool: &DbPool,
    user_id: &str,
    ttl: chrono::Duration,
) -> Result<(String, Session), sqlx::Error> {
    let token = generate_session_token();
    let now = Utc::now();
    let expires_at = now + ttl;

    sqlx::query(
        r#"
        INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(hash_session_token(&token))
    .bind(user_id)
    .bind(now.timestamp())
    .bind(expires_at.timestamp())
    .execute(pool)
    .await?;

    Ok((
        token,
        Session {
            user_id: user_id.to_string(),
            expires_at: Utc
                .timestamp_opt(expires_at.timestamp(), 0)
                .single()
                .unwrap_or(expires_at),
        },
    ))
}

/// Trova la sessione valida associata al token
pub async fn find_active_session(
    pool: &DbPool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<Session>, sqlx::Error> {
    let row: Option<(String, i64)> = sqlx::query_as(
        r#"
        SELECT user_id, expires_at
        FROM sessions
        WHERE token_hash = ? AND expires_at > ?
        "#,
    )
    .bind(hash_session_token(token))
    .bind(now.timestamp())
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|(user_id, expires_at)| {
        Utc.timestamp_opt(expires_at, 0)
            .single()
            .map(|expires_at| Session {
                user_id,
                expires_at,
            })
    }))
}

/// Elimina la sessione del token (logout)
pub async fn delete_session(pool: &DbPool, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_session_token(token))
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
