use chrono::{DateTime, Utc};
use pgp_common::{Amount, PaymentRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// PayGate's status code for a completed transaction.
pub const COMPLETED_STATUS_CODE: &str = "C";

/// Default page size for the reconciliation sweep over `BackOfficeSearchTransactions`.
pub const DEFAULT_SEARCH_PAGE_SIZE: usize = 100;

//--------------------------------------  Checkout request  ----------------------------------------------------------

/// The four URLs PayGate calls or redirects to once the user is done on the hosted payment page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackUrls {
    pub success: String,
    pub cancel: String,
    pub failure: String,
    pub server: String,
}

/// Extra key/value pairs echoed back to us in the server callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackParam {
    pub key: String,
    pub value: String,
}

/// Everything the caller needs to supply to start a PayGate payment session. Merchant
/// credentials are added by the client from its configuration.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub payment_ref: PaymentRef,
    pub client_name: String,
    pub email: String,
    /// Two-letter language code for the hosted payment page.
    pub language: String,
    /// Human-readable description of the basket lines.
    pub transaction_desc: String,
    pub currency: String,
    pub total_amount: Amount,
    pub callback_urls: CallbackUrls,
    pub server_params: Vec<CallbackParam>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CheckoutWireRequest {
    #[serde(rename = "ACCESS_TOKEN")]
    pub access_token: String,
    #[serde(rename = "MERCHANT_CODE")]
    pub merchant_code: String,
    #[serde(rename = "IS_RECURRENT")]
    pub is_recurrent: bool,
    #[serde(rename = "CLIENT_NAME")]
    pub client_name: String,
    #[serde(rename = "EMAIL")]
    pub email: String,
    #[serde(rename = "LANGUAGE")]
    pub language: String,
    #[serde(rename = "PAYMENT_REF")]
    pub payment_ref: PaymentRef,
    #[serde(rename = "TRANSACTION_DESC")]
    pub transaction_desc: String,
    #[serde(rename = "CURRENCY")]
    pub currency: String,
    // Decimal format: XXXXX.XX
    #[serde(rename = "TOTAL_AMOUNT")]
    pub total_amount: Amount,
    #[serde(rename = "PAYMENT_TYPES")]
    pub payment_types: Vec<String>,
    #[serde(rename = "CALLBACK_SUCCESS_URL")]
    pub callback_success_url: String,
    #[serde(rename = "CALLBACK_CANCEL_URL")]
    pub callback_cancel_url: String,
    #[serde(rename = "CALLBACK_FAILURE_URL")]
    pub callback_failure_url: String,
    #[serde(rename = "CALLBACK_SERVER_URL")]
    pub callback_server_url: String,
    #[serde(rename = "CALLBACK_SERVER_PARMS")]
    pub callback_server_parms: Vec<CallbackParam>,
}

/// Raw checkout response as PayGate returns it. Individual fields are validated in the client
/// once the whole exchange has been written to the audit trail.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CheckoutWireResponse {
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(rename = "Success")]
    pub success: Option<bool>,
    #[serde(rename = "ReturnCode")]
    pub return_code: Option<String>,
    #[serde(rename = "ShortReturnMessage")]
    pub short_return_message: Option<String>,
    #[serde(rename = "LongReturnMessage")]
    pub long_return_message: Option<String>,
    #[serde(rename = "SessionToken")]
    pub session_token: Option<String>,
    #[serde(rename = "PaymentID")]
    pub payment_id: Option<String>,
}

/// A validated, successful checkout: the user can now be redirected to the payment page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSuccess {
    pub payment_page_url: String,
    /// Session token for subsequent operations within the same payment session.
    pub session_token: String,
    /// PayGate's internal payment id, when it supplies one.
    pub payment_id: Option<String>,
}

//--------------------------------------  Transaction search  --------------------------------------------------------

/// Filter for `BackOfficeSearchTransactions`. Results are always requested in ascending
/// `PAYMENT_REF` order so that paging over a window is stable.
#[derive(Debug, Clone, Default)]
pub struct TransactionSearch {
    pub payment_ref: Option<PaymentRef>,
    pub status_code: Option<String>,
    pub from_datetime: Option<DateTime<Utc>>,
    pub to_datetime: Option<DateTime<Utc>>,
    pub next_rows: usize,
    pub offset_rows: usize,
}

impl TransactionSearch {
    /// Search for the completed transactions matching a single reference. Two rows are requested
    /// on purpose: one row confirms payment, two prove the reference is ambiguous.
    pub fn completed_by_ref(payment_ref: &PaymentRef) -> Self {
        Self {
            payment_ref: Some(payment_ref.clone()),
            status_code: Some(COMPLETED_STATUS_CODE.to_string()),
            next_rows: 2,
            offset_rows: 0,
            ..Self::default()
        }
    }

    /// One page of the completed transactions posted inside a time window.
    pub fn completed_in_window(from: DateTime<Utc>, to: DateTime<Utc>, next_rows: usize, offset_rows: usize) -> Self {
        Self {
            status_code: Some(COMPLETED_STATUS_CODE.to_string()),
            from_datetime: Some(from),
            to_datetime: Some(to),
            next_rows,
            offset_rows,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SearchWireRequest {
    #[serde(rename = "ACCESS_TOKEN")]
    pub access_token: String,
    #[serde(rename = "MERCHANT_CODE")]
    pub merchant_code: String,
    #[serde(rename = "PAYMENT_REF", skip_serializing_if = "Option::is_none")]
    pub payment_ref: Option<PaymentRef>,
    #[serde(rename = "STATUS_CODE", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    #[serde(rename = "FROM_DATETIME", skip_serializing_if = "Option::is_none")]
    pub from_datetime: Option<String>,
    #[serde(rename = "TO_DATETIME", skip_serializing_if = "Option::is_none")]
    pub to_datetime: Option<String>,
    #[serde(rename = "SORT_DIRECTION")]
    pub sort_direction: String,
    #[serde(rename = "SORT_COLUMN")]
    pub sort_column: String,
    #[serde(rename = "NEXT_ROWS")]
    pub next_rows: usize,
    #[serde(rename = "OFFSET_ROWS")]
    pub offset_rows: usize,
}

/// A gateway-side transaction record as returned by `BackOfficeSearchTransactions`. Immutable
/// once completed; this plugin only ever reads them. Note that the search result carries no
/// currency field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayTransaction {
    #[serde(rename = "MERCHANT_CODE")]
    pub merchant_code: String,
    #[serde(rename = "STATUS_CODE")]
    pub status_code: String,
    #[serde(rename = "PAYMENT_REF")]
    pub payment_ref: PaymentRef,
    /// Decimal string on the wire, e.g. "20.00".
    #[serde(rename = "PAYMENT_AMOUNT")]
    pub payment_amount: Amount,
    /// The upstream payment-network id, not PayGate's internal payment id.
    #[serde(rename = "TRANSACTION_ID")]
    pub transaction_id: String,
    /// VISA, MASTERCARD, PAYPAL, MBWAY, REFMB, DUC, ...
    #[serde(rename = "PAYMENT_TYPE_CODE")]
    pub payment_type_code: String,
    #[serde(rename = "CARD_MASKED_PAN", default, skip_serializing_if = "Option::is_none")]
    pub card_masked_pan: Option<String>,
}

impl GatewayTransaction {
    pub fn is_completed(&self) -> bool {
        self.status_code == COMPLETED_STATUS_CODE
    }
}

//--------------------------------------  Audit records  -------------------------------------------------------------

/// A new entry for the append-only processor-response audit log. One of these is written for
/// every outbound gateway request, every response or failure, and every inbound notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProcessorResponse {
    pub payment_ref: Option<PaymentRef>,
    pub transaction_id: Option<String>,
    pub payload: Value,
}

impl NewProcessorResponse {
    pub fn new(payment_ref: Option<PaymentRef>, transaction_id: Option<String>, payload: Value) -> Self {
        Self { payment_ref, transaction_id, payload }
    }

    /// Record of a request we are about to send, written before the network call is attempted.
    pub fn outbound(url: &str, timeout_secs: u64, payload: &Value, payment_ref: Option<&PaymentRef>) -> Self {
        let payload = serde_json::json!({ "url": url, "timeout": timeout_secs, "data": payload });
        Self { payment_ref: payment_ref.cloned(), transaction_id: None, payload }
    }

    /// Record of a failed exchange, written before the error is surfaced to the caller.
    pub fn failure(message: &str, detail: Value, payment_ref: Option<&PaymentRef>) -> Self {
        let payload = serde_json::json!({ "message": message, "response": detail });
        Self { payment_ref: payment_ref.cloned(), transaction_id: None, payload }
    }
}
