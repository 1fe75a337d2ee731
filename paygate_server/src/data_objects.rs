use std::fmt::Display;

use pgp_common::{Amount, PaymentRef, DEFAULT_CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body of a `POST /checkout` request from the host shop.
///
/// A bare `payment_ref` opens a session for a basket that was registered earlier; supplying the
/// customer fields and total registers (or refreshes) the basket in the same call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutInitRequest {
    pub payment_ref: PaymentRef,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub total: Option<Amount>,
    #[serde(default)]
    pub description: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY_CODE.to_string()
}

/// Query string of the browser-facing callback redirects.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CallbackQuery {
    #[serde(default, alias = "paymentRef", alias = "PAYMENT_REF")]
    pub payment_ref: Option<PaymentRef>,
}

/// Pull the payment reference out of a callback body. PayGate is not entirely consistent about
/// key casing across its environments, so several spellings are accepted.
pub fn extract_payment_ref(payload: &Value) -> Option<PaymentRef> {
    ["payment_ref", "paymentRef", "PAYMENT_REF"]
        .iter()
        .find_map(|key| payload.get(key))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(PaymentRef::from)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::extract_payment_ref;

    #[test]
    fn accepts_the_spellings_paygate_uses() {
        for key in ["payment_ref", "paymentRef", "PAYMENT_REF"] {
            let payload = json!({ key: "bsk-1" });
            assert_eq!(extract_payment_ref(&payload).unwrap().as_str(), "bsk-1");
        }
    }

    #[test]
    fn missing_or_empty_refs_are_rejected() {
        assert!(extract_payment_ref(&json!({})).is_none());
        assert!(extract_payment_ref(&json!({"payment_ref": ""})).is_none());
        assert!(extract_payment_ref(&json!({"payment_ref": 42})).is_none());
    }
}
