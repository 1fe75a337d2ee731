use pgp_common::PaymentRef;

use crate::{
    data_objects::{CheckoutRequest, CheckoutSuccess, GatewayTransaction, NewProcessorResponse, TransactionSearch},
    GatewayError,
};

/// Destination for processor-response audit records.
///
/// Implementations must be best-effort: a failing audit write is logged by the implementation
/// and must never fail the payment path itself. Returns the id of the stored record, when one
/// was stored.
#[allow(async_fn_in_trait)]
pub trait AuditSink {
    async fn record_response(&self, entry: NewProcessorResponse) -> Option<i64>;
}

/// The gateway operations the reconciliation engine consumes. [`crate::PayGateApi`] is the real
/// implementation; tests substitute a mock so that confirmation logic can be exercised against
/// arbitrary search results.
#[allow(async_fn_in_trait)]
pub trait GatewayApi {
    /// Start a payment session. Fails hard unless PayGate reports `Success == true`.
    async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutSuccess, GatewayError>;

    /// One page of `BackOfficeSearchTransactions` results.
    async fn search_transactions(&self, filter: TransactionSearch) -> Result<Vec<GatewayTransaction>, GatewayError>;

    /// Force-mark a reference as paid. Only works against PayGate test environments. Gateway
    /// errors are swallowed into `false`; this is an interactive operator action.
    async fn mark_test_payment_as_paid(&self, payment_ref: &PaymentRef) -> bool;

    /// The completed transactions for a single reference, capped at two rows. Two rows are all
    /// the confirmation check needs to tell "paid" apart from "ambiguous".
    async fn search_completed_by_ref(
        &self,
        payment_ref: &PaymentRef,
    ) -> Result<Vec<GatewayTransaction>, GatewayError> {
        self.search_transactions(TransactionSearch::completed_by_ref(payment_ref)).await
    }
}
