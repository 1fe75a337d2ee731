use paygate_api::data_objects::NewProcessorResponse;
use pgp_common::PaymentRef;
use sqlx::SqliteConnection;

use crate::db_types::ProcessorResponse;

pub async fn insert_response(entry: NewProcessorResponse, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO processor_responses (payment_ref, transaction_id, payload) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(entry.payment_ref.as_ref().map(|r| r.as_str().to_string()))
    .bind(entry.transaction_id)
    .bind(entry.payload.to_string())
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn fetch_responses_for_ref(
    payment_ref: &PaymentRef,
    conn: &mut SqliteConnection,
) -> Result<Vec<ProcessorResponse>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT id, payment_ref, transaction_id, payload, created_at
           FROM processor_responses WHERE payment_ref = $1 ORDER BY id"#,
    )
    .bind(payment_ref.as_str())
    .fetch_all(conn)
    .await
}
