use chrono::Utc;

use super::DbPool;

/// Iscrive un indirizzo; ritorna `false` se era gia' iscritto
pub async fn subscribe(pool: &DbPool, email: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO newsletter_subscribers (id, email, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(email)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
