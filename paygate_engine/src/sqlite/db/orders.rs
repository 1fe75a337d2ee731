use pgp_common::PaymentRef;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order},
    traits::InsertOrderResult,
};

pub async fn order_exists(payment_ref: &PaymentRef, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM orders WHERE payment_ref = $1 LIMIT 1")
        .bind(payment_ref.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

pub async fn fetch_order_by_payment_ref(
    payment_ref: &PaymentRef,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT id, payment_ref, basket_id, total, currency, transaction_id, payment_type, card_mask, created_at
           FROM orders WHERE payment_ref = $1"#,
    )
    .bind(payment_ref.as_str())
    .fetch_optional(conn)
    .await
}

/// Race-safe idempotent insert. The UNIQUE constraint on `payment_ref` is the
/// arbiter: `ON CONFLICT DO NOTHING` returns no row when another writer got
/// there first, in which case the existing order is fetched and reported.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, sqlx::Error> {
    let inserted: Option<Order> = sqlx::query_as(
        r#"INSERT INTO orders (payment_ref, basket_id, total, currency, transaction_id, payment_type, card_mask)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           ON CONFLICT (payment_ref) DO NOTHING
           RETURNING id, payment_ref, basket_id, total, currency, transaction_id, payment_type, card_mask, created_at"#,
    )
    .bind(order.payment_ref.as_str())
    .bind(order.basket_id)
    .bind(order.total)
    .bind(&order.currency)
    .bind(&order.transaction_id)
    .bind(&order.payment_type)
    .bind(&order.card_mask)
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(order) => Ok(InsertOrderResult::Inserted(order)),
        None => {
            let existing =
                fetch_order_by_payment_ref(&order.payment_ref, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
            Ok(InsertOrderResult::AlreadyExists(existing))
        },
    }
}
