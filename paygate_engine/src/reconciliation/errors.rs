use paygate_api::GatewayError;
use thiserror::Error;

use crate::traits::StoreError;

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Could not place order: {0}")]
    OrderPlacement(String),
}
