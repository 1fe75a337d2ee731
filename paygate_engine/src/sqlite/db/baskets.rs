use pgp_common::PaymentRef;
use sqlx::SqliteConnection;

use crate::db_types::{Basket, NewBasket};

pub async fn fetch_basket_by_payment_ref(
    payment_ref: &PaymentRef,
    conn: &mut SqliteConnection,
) -> Result<Option<Basket>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT id, payment_ref, customer_name, customer_email, currency, total, description, created_at
           FROM baskets WHERE payment_ref = $1"#,
    )
    .bind(payment_ref.as_str())
    .fetch_optional(conn)
    .await
}

/// Register a basket, updating the stored copy if the reference is already
/// known. The host shop is the source of truth for basket contents.
pub async fn upsert_basket(basket: NewBasket, conn: &mut SqliteConnection) -> Result<Basket, sqlx::Error> {
    sqlx::query_as(
        r#"INSERT INTO baskets (payment_ref, customer_name, customer_email, currency, total, description)
           VALUES ($1, $2, $3, $4, $5, $6)
           ON CONFLICT (payment_ref) DO UPDATE SET
               customer_name = excluded.customer_name,
               customer_email = excluded.customer_email,
               currency = excluded.currency,
               total = excluded.total,
               description = excluded.description
           RETURNING id, payment_ref, customer_name, customer_email, currency, total, description, created_at"#,
    )
    .bind(basket.payment_ref.as_str())
    .bind(&basket.customer_name)
    .bind(&basket.customer_email)
    .bind(&basket.currency)
    .bind(basket.total)
    .bind(&basket.description)
    .fetch_one(conn)
    .await
}
