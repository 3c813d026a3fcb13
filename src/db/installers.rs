use super::DbPool;

/// Verifica se esiste un record installatore per l'utente
pub async fn is_installer(pool: &DbPool, user_id: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM installers WHERE user_id = ? LIMIT 1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Registra un installatore (idempotente). I record arrivano dal backend
/// di onboarding; qui serve solo ai test.
#[cfg(test)]
pub(crate) async fn add_installer(
    pool: &DbPool,
    user_id: &str,
    company_name: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO installers (user_id, company_name, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(company_name)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}
