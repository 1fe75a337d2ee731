use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::db_types::{ConfirmedPayment, Order};

/// Verdict of the trust-but-verify query against the gateway's transaction
/// search. Only `Confirmed` carries payment details; every other variant is an
/// expected business outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentConfirmation {
    Confirmed(ConfirmedPayment),
    /// The gateway has no completed transaction for this reference.
    NoMatch,
    /// More than one row came back. The payment reference is supposed to be
    /// unique per completed transaction, so this is treated as unverifiable.
    Ambiguous(usize),
    /// Exactly one row came back but its merchant code, status or payment
    /// reference did not match what we asked for.
    FieldMismatch,
}

impl Display for PaymentConfirmation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentConfirmation::Confirmed(p) => write!(f, "confirmed ({})", p.payment_ref),
            PaymentConfirmation::NoMatch => write!(f, "no matching transaction"),
            PaymentConfirmation::Ambiguous(n) => write!(f, "{n} matching transactions"),
            PaymentConfirmation::FieldMismatch => write!(f, "transaction fields did not match"),
        }
    }
}

/// Where a payment notification came from. Recorded with the audit entry so a
/// sweep-triggered retry is distinguishable from a real gateway callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOrigin {
    ServerCallback,
    BrowserSuccess,
    SweepRetry,
}

impl Display for NotificationOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationOrigin::ServerCallback => "server_callback",
            NotificationOrigin::BrowserSuccess => "browser_success",
            NotificationOrigin::SweepRetry => "sweep_retry",
        };
        write!(f, "{s}")
    }
}

/// What processing a payment notification amounted to. Duplicates and orphans
/// are normal traffic and are reported here rather than as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    OrderCreated(Order),
    /// An order for this payment reference already exists.
    AlreadyProcessed,
    /// No basket is registered under this payment reference.
    BasketNotFound,
    /// The gateway would not vouch for the payment.
    NotConfirmed(PaymentConfirmation),
}

/// Tally of one reconciliation sweep over a time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub pages: usize,
    pub transactions: usize,
    pub orders_created: usize,
    pub already_ordered: usize,
    pub orphaned: usize,
    pub failures: usize,
}

impl Display for SweepSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} transaction(s) over {} page(s): {} order(s) created, {} already ordered, {} orphaned, {} failure(s)",
            self.transactions,
            self.pages,
            self.orders_created,
            self.already_ordered,
            self.orphaned,
            self.failures
        )
    }
}
