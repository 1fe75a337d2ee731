//! Storage traits for the reconciliation engine.
//!
//! The engine core is storage-agnostic. Hosts inject an implementation of
//! [`PaymentStore`] (basket lookup + order placement + response audit trail)
//! into [`crate::ReconciliationApi`] at construction time. The `sqlite`
//! feature provides [`crate::sqlite::SqliteDatabase`] as a ready-made store.

use paygate_api::AuditSink;
use pgp_common::PaymentRef;
use thiserror::Error;

use crate::db_types::{Basket, NewBasket, NewOrder, Order};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

/// Result of an idempotent order insertion attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOrderResult {
    /// The order was placed by this call.
    Inserted(Order),
    /// An order for this payment reference already existed. Carries the
    /// existing row so callers can report what won the race.
    AlreadyExists(Order),
}

#[allow(async_fn_in_trait)]
pub trait BasketRepository {
    /// Look up the basket that a payment notification refers to. `None` means
    /// the reference is unknown to the shop and the notification is orphaned.
    async fn fetch_basket_by_payment_ref(
        &self,
        payment_ref: &PaymentRef,
    ) -> Result<Option<Basket>, StoreError>;

    /// Register a basket, or refresh the stored copy if the reference is
    /// already known. The host shop stays the source of truth for basket
    /// contents.
    async fn upsert_basket(&self, basket: NewBasket) -> Result<Basket, StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait OrderRepository {
    /// The single authoritative "has this basket already been paid?" check.
    async fn order_exists(&self, payment_ref: &PaymentRef) -> Result<bool, StoreError>;

    /// Insert an order unless one already exists for the same payment
    /// reference. Implementations must be race-safe: two concurrent calls for
    /// the same reference result in exactly one `Inserted`.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, StoreError>;
}

/// Everything the reconciliation engine needs from persistent storage.
pub trait PaymentStore: BasketRepository + OrderRepository + AuditSink {}

impl<T> PaymentStore for T where T: BasketRepository + OrderRepository + AuditSink {}
