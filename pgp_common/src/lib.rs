mod amount;
mod payment_ref;
mod secret;

pub use amount::{Amount, AmountParseError, DEFAULT_CURRENCY_CODE};
pub use payment_ref::PaymentRef;
pub use secret::Secret;
