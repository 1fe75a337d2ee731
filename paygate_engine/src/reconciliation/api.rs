use chrono::{DateTime, Utc};
use log::*;
use paygate_api::{
    data_objects::{
        CallbackParam, CallbackUrls, CheckoutRequest, CheckoutSuccess, NewProcessorResponse,
        TransactionSearch, COMPLETED_STATUS_CODE, DEFAULT_SEARCH_PAGE_SIZE,
    },
    GatewayApi,
};
use pgp_common::PaymentRef;
use serde_json::{json, Value};

use crate::{
    db_types::{Basket, ConfirmedPayment, NewOrder},
    reconciliation::{
        errors::ReconciliationError,
        objects::{NotificationOrigin, NotificationOutcome, PaymentConfirmation, SweepSummary},
    },
    traits::{InsertOrderResult, PaymentStore},
};

/// The reconciliation engine proper.
///
/// Holds a payment store and a gateway client, both injected at construction.
/// Every payment notification, regardless of origin, goes through
/// [`Self::process_payment_notification`].
#[derive(Debug, Clone)]
pub struct ReconciliationApi<B, G> {
    db: B,
    gateway: G,
    merchant_code: String,
}

impl<B, G> ReconciliationApi<B, G>
where
    B: PaymentStore,
    G: GatewayApi,
{
    pub fn new(db: B, gateway: G, merchant_code: String) -> Self {
        Self { db, gateway, merchant_code }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Ask the gateway whether a payment reference has actually been paid.
    ///
    /// Queries the transaction search capped at two rows and confirms only
    /// when exactly one row comes back and that row carries our merchant
    /// code, the completed status and the reference we asked for.
    pub async fn confirm_paid(
        &self,
        payment_ref: &PaymentRef,
    ) -> Result<PaymentConfirmation, ReconciliationError> {
        let rows = self.gateway.search_completed_by_ref(payment_ref).await?;
        debug!("🔄️ Gateway search for [{payment_ref}] returned {} transaction(s)", rows.len());
        let confirmation = match rows.as_slice() {
            [] => PaymentConfirmation::NoMatch,
            [tx] => {
                let matches = tx.merchant_code == self.merchant_code
                    && tx.is_completed()
                    && tx.payment_ref == *payment_ref;
                if matches {
                    PaymentConfirmation::Confirmed(ConfirmedPayment::from(tx))
                } else {
                    warn!(
                        "🔄️ Transaction for [{payment_ref}] does not match what was asked for. \
                         merchant_code={}, status_code={}, payment_ref={}",
                        tx.merchant_code, tx.status_code, tx.payment_ref
                    );
                    PaymentConfirmation::FieldMismatch
                }
            },
            many => PaymentConfirmation::Ambiguous(many.len()),
        };
        Ok(confirmation)
    }

    /// Process a payment notification. This is the single code path shared by
    /// the server callback, the browser success redirect and the sweep
    /// worker.
    ///
    /// The notification payload is written to the audit trail unconditionally.
    /// The payment is then re-verified against the gateway; only a confirmed
    /// payment with a known basket and no pre-existing order results in an
    /// order. Duplicate notifications report `AlreadyProcessed`, which callers
    /// acknowledge rather than reject, since the gateway retries callbacks it
    /// thinks have failed.
    pub async fn process_payment_notification(
        &self,
        payment_ref: &PaymentRef,
        payload: Value,
        origin: NotificationOrigin,
    ) -> Result<NotificationOutcome, ReconciliationError> {
        let entry = json!({ "origin": origin, "data": payload });
        let _ = self
            .db
            .record_response(NewProcessorResponse::new(Some(payment_ref.clone()), None, entry))
            .await;
        let Some(basket) = self.db.fetch_basket_by_payment_ref(payment_ref).await? else {
            warn!("🔄️ Received {origin} notification for [{payment_ref}], but no basket carries that reference");
            return Ok(NotificationOutcome::BasketNotFound);
        };
        match self.confirm_paid(payment_ref).await? {
            PaymentConfirmation::Confirmed(payment) => {
                if self.db.order_exists(payment_ref).await? {
                    info!("🔄️ [{payment_ref}] is already ordered. Acknowledging the duplicate {origin} notification.");
                    return Ok(NotificationOutcome::AlreadyProcessed);
                }
                let new_order = NewOrder::from_confirmation(&basket, &payment);
                match self.db.insert_order(new_order).await? {
                    InsertOrderResult::Inserted(order) => {
                        info!(
                            "🔄️ Order #{} created for [{payment_ref}]. {} paid via {} ({}).",
                            order.id, order.total, order.payment_type, order.card_mask
                        );
                        Ok(NotificationOutcome::OrderCreated(order))
                    },
                    InsertOrderResult::AlreadyExists(order) => {
                        info!(
                            "🔄️ Lost the race to order [{payment_ref}]; order #{} already exists.",
                            order.id
                        );
                        Ok(NotificationOutcome::AlreadyProcessed)
                    },
                }
            },
            not_confirmed => {
                warn!("🔄️ Could not double-check payment for [{payment_ref}]: {not_confirmed}");
                Ok(NotificationOutcome::NotConfirmed(not_confirmed))
            },
        }
    }

    /// Sweep the gateway's completed transactions over `[from, to]` and retry
    /// any that never became orders.
    ///
    /// Pages through the search iteratively; a short page terminates the
    /// sweep. Retries go through [`Self::process_payment_notification`] with a
    /// synthetic payload, so a sweep-created order is verified exactly like a
    /// callback-created one.
    pub async fn reconcile_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        page_size: usize,
    ) -> Result<SweepSummary, ReconciliationError> {
        let page_size = if page_size == 0 { DEFAULT_SEARCH_PAGE_SIZE } else { page_size };
        let mut summary = SweepSummary::default();
        let mut offset = 0;
        loop {
            let filter = TransactionSearch::completed_in_window(from, to, page_size, offset);
            let rows = self.gateway.search_transactions(filter).await?;
            summary.pages += 1;
            let row_count = rows.len();
            for tx in rows {
                summary.transactions += 1;
                let payment_ref = tx.payment_ref.clone();
                if self.db.fetch_basket_by_payment_ref(&payment_ref).await?.is_none() {
                    warn!("🕰️ No basket carries reference [{payment_ref}]. Skipping.");
                    summary.orphaned += 1;
                    continue;
                }
                if self.db.order_exists(&payment_ref).await? {
                    summary.already_ordered += 1;
                    continue;
                }
                info!("🕰️ [{payment_ref}] is completed at the gateway but has no order. Retrying.");
                let payload = json!({
                    "payment_ref": &payment_ref,
                    "statusCode": COMPLETED_STATUS_CODE,
                    "success": true,
                });
                match self
                    .process_payment_notification(&payment_ref, payload, NotificationOrigin::SweepRetry)
                    .await
                {
                    Ok(NotificationOutcome::OrderCreated(_)) => summary.orders_created += 1,
                    Ok(NotificationOutcome::AlreadyProcessed) => summary.already_ordered += 1,
                    Ok(other) => {
                        warn!("🕰️ Retry for [{payment_ref}] did not produce an order: {other:?}");
                        summary.failures += 1;
                    },
                    Err(e) => {
                        warn!("🕰️ Retry for [{payment_ref}] failed. {e}");
                        summary.failures += 1;
                    },
                }
            }
            if row_count < page_size {
                break;
            }
            offset += page_size;
        }
        Ok(summary)
    }

    /// Open a payment session at the gateway for a registered basket.
    ///
    /// An audit stub is written before the gateway call so that even a
    /// session that dies mid-flight leaves a trace.
    pub async fn begin_checkout(
        &self,
        basket: &Basket,
        language: &str,
        callback_urls: CallbackUrls,
        server_params: Vec<CallbackParam>,
    ) -> Result<CheckoutSuccess, ReconciliationError> {
        let _ = self
            .db
            .record_response(NewProcessorResponse::new(
                Some(basket.payment_ref.clone()),
                None,
                json!({ "checkout_started": true }),
            ))
            .await;
        let request = CheckoutRequest {
            payment_ref: basket.payment_ref.clone(),
            client_name: basket.customer_name.clone(),
            email: basket.customer_email.clone(),
            language: language.to_string(),
            transaction_desc: basket.description.clone(),
            currency: basket.currency.clone(),
            total_amount: basket.total,
            callback_urls,
            server_params,
        };
        let success = self.gateway.checkout(request).await?;
        info!("🔄️ Checkout session opened for [{}]", basket.payment_ref);
        Ok(success)
    }

    /// Force-mark a payment as paid in a PayGate test environment.
    pub async fn mark_test_paid(&self, payment_ref: &PaymentRef) -> bool {
        self.gateway.mark_test_payment_as_paid(payment_ref).await
    }
}
