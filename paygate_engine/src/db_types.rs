use chrono::{DateTime, Utc};
use paygate_api::data_objects::GatewayTransaction;
use pgp_common::{Amount, PaymentRef};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A basket the host shop has opened and sent to the payment page. The shop
/// owns basket contents; the engine only needs the fields that identify the
/// basket and the amount the customer is expected to pay.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Basket {
    pub id: i64,
    pub payment_ref: PaymentRef,
    pub customer_name: String,
    pub customer_email: String,
    pub currency: String,
    pub total: Amount,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to register a basket with the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBasket {
    pub payment_ref: PaymentRef,
    pub customer_name: String,
    pub customer_email: String,
    pub currency: String,
    pub total: Amount,
    pub description: String,
}

/// A paid order. At most one order ever exists per payment reference; the
/// storage layer enforces this with a UNIQUE constraint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Order {
    pub id: i64,
    pub payment_ref: PaymentRef,
    pub basket_id: i64,
    pub total: Amount,
    pub currency: String,
    /// Transaction id assigned by the upstream payment network.
    pub transaction_id: String,
    pub payment_type: String,
    pub card_mask: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewOrder {
    pub payment_ref: PaymentRef,
    pub basket_id: i64,
    pub total: Amount,
    pub currency: String,
    pub transaction_id: String,
    pub payment_type: String,
    pub card_mask: String,
}

impl NewOrder {
    pub fn from_confirmation(basket: &Basket, payment: &ConfirmedPayment) -> Self {
        Self {
            payment_ref: basket.payment_ref.clone(),
            basket_id: basket.id,
            total: payment.amount,
            currency: basket.currency.clone(),
            transaction_id: payment.transaction_id.clone(),
            payment_type: payment.payment_type.clone(),
            card_mask: payment.card_mask.clone(),
        }
    }
}

/// The details the gateway vouched for after a successful verification query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmedPayment {
    pub payment_ref: PaymentRef,
    pub amount: Amount,
    pub transaction_id: String,
    pub payment_type: String,
    pub card_mask: String,
}

impl From<&GatewayTransaction> for ConfirmedPayment {
    fn from(tx: &GatewayTransaction) -> Self {
        // Some payment types (MBWay, bank references) carry no card PAN; the
        // payment type code stands in as the mask in that case.
        let card_mask = tx.card_masked_pan.clone().unwrap_or_else(|| tx.payment_type_code.clone());
        Self {
            payment_ref: tx.payment_ref.clone(),
            amount: tx.payment_amount,
            transaction_id: tx.transaction_id.clone(),
            payment_type: tx.payment_type_code.clone(),
            card_mask,
        }
    }
}

/// An audit record of one exchange with the gateway or one inbound
/// notification. The payload is stored as serialized JSON.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ProcessorResponse {
    pub id: i64,
    pub payment_ref: Option<PaymentRef>,
    pub transaction_id: Option<String>,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}
