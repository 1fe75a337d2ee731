use thiserror::Error;

/// Normalized error type for every exchange with PayGate. Transport, parse and protocol failures
/// all end up here so that callers have one thing to match on; the raw response detail rides
/// along for the audit trail rather than for user display.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("API timeout")]
    Timeout,
    #[error("Could not send request to PayGate: {0}")]
    RequestError(String),
    #[error("Could not parse JSON content from response")]
    UnparseableResponse { body: String },
    #[error("Invalid API response. Status {status}")]
    InvalidResponse { status: u16, body: String, data: serde_json::Value },
    #[error("PayGate checkout was not successful. code={return_code} message={short_message}")]
    CheckoutRejected { return_code: String, short_message: String, long_message: String },
    #[error("Could not parse '{field}' field from response")]
    MissingField { field: String, data: serde_json::Value },
}
