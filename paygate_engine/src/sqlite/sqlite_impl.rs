use log::*;
use paygate_api::{data_objects::NewProcessorResponse, AuditSink};
use pgp_common::PaymentRef;
use sqlx::SqlitePool;

use crate::{
    db_types::{Basket, NewBasket, NewOrder, Order, ProcessorResponse},
    sqlite::db,
    traits::{BasketRepository, InsertOrderResult, OrderRepository, StoreError},
};

/// SQLite-backed [`crate::traits::PaymentStore`].
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect to `url`, creating the schema if needed.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = db::new_pool(url, max_connections).await?;
        db::create_schema(&pool).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Wrap an existing pool. Used by tests that hold an in-memory database
    /// open on a single connection.
    pub async fn new_with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        db::create_schema(&pool).await?;
        Ok(Self { url: "<pool>".to_string(), pool })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn fetch_order_by_payment_ref(&self, payment_ref: &PaymentRef) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = db::orders::fetch_order_by_payment_ref(payment_ref, &mut conn).await?;
        Ok(order)
    }

    pub async fn fetch_responses_for_ref(
        &self,
        payment_ref: &PaymentRef,
    ) -> Result<Vec<ProcessorResponse>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let responses = db::responses::fetch_responses_for_ref(payment_ref, &mut conn).await?;
        Ok(responses)
    }
}

impl BasketRepository for SqliteDatabase {
    async fn fetch_basket_by_payment_ref(&self, payment_ref: &PaymentRef) -> Result<Option<Basket>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let basket = db::baskets::fetch_basket_by_payment_ref(payment_ref, &mut conn).await?;
        Ok(basket)
    }

    async fn upsert_basket(&self, basket: NewBasket) -> Result<Basket, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let basket = db::baskets::upsert_basket(basket, &mut conn).await?;
        Ok(basket)
    }
}

impl OrderRepository for SqliteDatabase {
    async fn order_exists(&self, payment_ref: &PaymentRef) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let exists = db::orders::order_exists(payment_ref, &mut conn).await?;
        Ok(exists)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = db::orders::idempotent_insert(order, &mut conn).await?;
        Ok(result)
    }
}

impl AuditSink for SqliteDatabase {
    async fn record_response(&self, entry: NewProcessorResponse) -> Option<i64> {
        let mut conn = match self.pool.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("📝️ Could not store processor response. {e}");
                return None;
            },
        };
        match db::responses::insert_response(entry, &mut conn).await {
            Ok(id) => Some(id),
            Err(e) => {
                error!("📝️ Could not store processor response. {e}");
                None
            },
        }
    }
}
