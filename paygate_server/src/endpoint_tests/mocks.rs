use chrono::Utc;
use mockall::mock;
use paygate_api::{
    data_objects::{
        CheckoutRequest, CheckoutSuccess, GatewayTransaction, NewProcessorResponse, TransactionSearch,
    },
    AuditSink, GatewayApi, GatewayError,
};
use paygate_engine::{
    db_types::{Basket, NewBasket, NewOrder, Order},
    traits::{BasketRepository, InsertOrderResult, OrderRepository, StoreError},
};
use pgp_common::{Amount, PaymentRef};

mock! {
    pub Store {}
    impl BasketRepository for Store {
        async fn fetch_basket_by_payment_ref(&self, payment_ref: &PaymentRef) -> Result<Option<Basket>, StoreError>;
        async fn upsert_basket(&self, basket: NewBasket) -> Result<Basket, StoreError>;
    }
    impl OrderRepository for Store {
        async fn order_exists(&self, payment_ref: &PaymentRef) -> Result<bool, StoreError>;
        async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, StoreError>;
    }
    impl AuditSink for Store {
        async fn record_response(&self, entry: NewProcessorResponse) -> Option<i64>;
    }
}

mock! {
    pub Gateway {}
    impl GatewayApi for Gateway {
        async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutSuccess, GatewayError>;
        async fn search_transactions(&self, filter: TransactionSearch) -> Result<Vec<GatewayTransaction>, GatewayError>;
        async fn mark_test_payment_as_paid(&self, payment_ref: &PaymentRef) -> bool;
    }
}

pub const MERCHANT: &str = "TESTMERCHANT";

pub fn completed_tx(payment_ref: &str, cents: i64) -> GatewayTransaction {
    GatewayTransaction {
        merchant_code: MERCHANT.to_string(),
        status_code: "C".to_string(),
        payment_ref: PaymentRef::from(payment_ref),
        payment_amount: Amount::from_cents(cents),
        transaction_id: "041234567890".to_string(),
        payment_type_code: "VISA".to_string(),
        card_masked_pan: Some("402400xxxxxx0848".to_string()),
    }
}

pub fn basket(payment_ref: &str, cents: i64) -> Basket {
    Basket {
        id: 1,
        payment_ref: PaymentRef::from(payment_ref),
        customer_name: "Alice Smith".to_string(),
        customer_email: "alice@example.com".to_string(),
        currency: "EUR".to_string(),
        total: Amount::from_cents(cents),
        description: "Test basket".to_string(),
        created_at: Utc::now(),
    }
}

pub fn order(payment_ref: &str, cents: i64) -> Order {
    Order {
        id: 10,
        payment_ref: PaymentRef::from(payment_ref),
        basket_id: 1,
        total: Amount::from_cents(cents),
        currency: "EUR".to_string(),
        transaction_id: "041234567890".to_string(),
        payment_type: "VISA".to_string(),
        card_mask: "402400xxxxxx0848".to_string(),
        created_at: Utc::now(),
    }
}
