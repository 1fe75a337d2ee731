pub mod baskets;
pub mod orders;
pub mod responses;

use log::*;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub fn db_url() -> String {
    std::env::var("PGP_DATABASE_URL").unwrap_or_else(|_| {
        warn!("📝️ PGP_DATABASE_URL is not set. Using the default database url.");
        "sqlite://data/paygate.db".to_string()
    })
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new().max_connections(max_connections).connect(url).await
}

/// Idempotent schema creation. Safe to run on every startup.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS baskets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            payment_ref TEXT NOT NULL UNIQUE,
            customer_name TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            currency TEXT NOT NULL,
            total INTEGER NOT NULL,
            description TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            payment_ref TEXT NOT NULL UNIQUE,
            basket_id INTEGER NOT NULL REFERENCES baskets(id),
            total INTEGER NOT NULL,
            currency TEXT NOT NULL,
            transaction_id TEXT NOT NULL,
            payment_type TEXT NOT NULL,
            card_mask TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS processor_responses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            payment_ref TEXT,
            transaction_id TEXT,
            payload TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_responses_payment_ref ON processor_responses (payment_ref);
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
