use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;

/// The purchase reference correlating a checkout attempt across the e-commerce host, this plugin
/// and PayGate. The host generates it when checkout starts and PayGate echoes it back verbatim in
/// the `PAYMENT_REF` field of every notification and transaction record.
#[derive(Debug, Clone, Type, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentRef(pub String);

impl PaymentRef {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<S: Into<String>> From<S> for PaymentRef {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for PaymentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
