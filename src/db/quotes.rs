use chrono::Utc;

use super::DbPool;

/// Richiesta di preventivo gia' validata
#[derive(Debug, Clone)]
pub struct NewQuote {
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
    pub zip_code: String,
    pub monthly_bill_cents: i64,
    pub roof_type: Option<String>,
    pub message: Option<String>,
}

/// Salva una richiesta di preventivo, ritorna l'id
pub async fn create_quote(pool: &DbPool, quote: &NewQuote) -> Result<String, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO quote_requests (id, user_id, name, email, zip_code, monthly_bill_cents, roof_type, message, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&quote.user_id)
    .bind(&quote.name)
    .bind(&quote.email)
    .bind(&quote.zip_code)
    .bind(quote.monthly_bill_cents)
    .bind(&quote.roof_type)
    .bind(&quote.message)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Numero di richieste salvate
#[cfg(test)]
pub(crate) async fn count_quotes(pool: &DbPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quote_requests")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
