//! # Payment reconciliation engine
//!
//! The engine sits between the host shop (which owns baskets) and the PayGate
//! gateway (which owns the money). Its one job is to decide, safely, when a
//! basket may be turned into an order.
//!
//! The cardinal rule: **a notification is a hint, never proof**. Whether the
//! hint arrives via the server-to-server callback, the customer's browser, or
//! a periodic sweep, the engine always re-queries the gateway's transaction
//! search and only places an order when exactly one completed transaction
//! matches the merchant, status and payment reference. All three entry points
//! funnel into [`ReconciliationApi::process_payment_notification`], so the
//! verification and idempotency logic exists in exactly one place.
//!
//! Storage is abstracted behind the [`traits`] module; a SQLite implementation
//! is provided behind the `sqlite` feature (on by default).

pub mod db_types;
pub mod reconciliation;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use reconciliation::{
    NotificationOrigin, NotificationOutcome, PaymentConfirmation, ReconciliationApi,
    ReconciliationError, SweepSummary,
};
