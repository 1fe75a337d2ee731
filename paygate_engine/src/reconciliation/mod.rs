mod api;
mod errors;
mod objects;

pub use api::ReconciliationApi;
pub use errors::ReconciliationError;
pub use objects::{NotificationOrigin, NotificationOutcome, PaymentConfirmation, SweepSummary};
