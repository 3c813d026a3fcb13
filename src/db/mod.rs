pub mod installers;
pub mod newsletter;
pub mod quotes;
pub mod sessions;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::time::Duration;

pub type DbPool = SqlitePool;

/// Inizializza il database SQLite
pub async fn init_db(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .idle_timeout(Duration::from_secs(60))
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Esegue le migrazioni del database
async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // Sessioni emesse dal backend di autenticazione (token salvato come hash)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)"#)
        .execute(pool)
        .await?;

    // Record installatori: la presenza dell'utente qui determina il ruolo
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS installers (
            user_id TEXT PRIMARY KEY,
            company_name TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS newsletter_subscribers (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quote_requests (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            zip_code TEXT NOT NULL,
            monthly_bill_cents INTEGER NOT NULL,
            roof_type TEXT,
            message TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_quotes_created_at ON quote_requests(created_at)"#)
        .execute(pool)
        .await?;

    Ok(())
}

/// Pool in memoria per i test: una sola connessione, altrimenti ogni
/// connessione vedrebbe un database diverso
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("pool sqlite in memoria");
    run_migrations(&pool).await.expect("migrazioni");
    pool
}
