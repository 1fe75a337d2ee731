use std::{sync::Arc, time::Duration};

use log::*;
use pgp_common::PaymentRef;
use reqwest::Client;
use serde_json::Value;

use crate::{
    config::PayGateConfig,
    data_objects::{
        CheckoutRequest,
        CheckoutSuccess,
        CheckoutWireRequest,
        CheckoutWireResponse,
        GatewayTransaction,
        NewProcessorResponse,
        SearchWireRequest,
        TransactionSearch,
    },
    error::GatewayError,
    traits::{AuditSink, GatewayApi},
};

/// The PayGate JSON API client. All three endpoints are a single POST-JSON exchange over the
/// same primitive, [`PayGateApi::call_api`], which handles basic auth, timeouts, error
/// normalization and audit recording. The client never retries; retry policy belongs to the
/// callers (and ultimately the reconciliation sweep).
#[derive(Clone)]
pub struct PayGateApi<R> {
    config: PayGateConfig,
    client: Arc<Client>,
    audit: R,
}

impl<R> PayGateApi<R>
where R: AuditSink
{
    pub fn new(config: PayGateConfig, audit: R) -> Result<Self, GatewayError> {
        let client = Client::builder().build().map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), audit })
    }

    pub fn config(&self) -> &PayGateConfig {
        &self.config
    }

    /// Execute one authenticated JSON exchange with PayGate.
    ///
    /// The outgoing request is written to the audit log before the network call is attempted, so
    /// the attempt is traceable even if the connection never establishes. Every failure is also
    /// recorded before it is surfaced.
    pub async fn call_api(
        &self,
        url: &str,
        payload: Value,
        timeout: Duration,
        payment_ref: Option<&PaymentRef>,
    ) -> Result<Value, GatewayError> {
        if payment_ref.is_some() {
            self.audit
                .record_response(NewProcessorResponse::outbound(url, timeout.as_secs(), &payload, payment_ref))
                .await;
        }
        debug!("🔌️ Calling PayGate at {url}");
        trace!("🔌️ Payload: {payload}");
        let mut req = self.client.post(url).json(&payload).timeout(timeout);
        if !self.config.api_basic_auth_user.is_empty() {
            req = req
                .basic_auth(&self.config.api_basic_auth_user, Some(self.config.api_basic_auth_pass.reveal().as_str()));
        }
        let response = match req.send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return Err(self.record_failure("API timeout", Value::Null, payment_ref, GatewayError::Timeout).await);
            },
            Err(e) => {
                let err = GatewayError::RequestError(e.to_string());
                return Err(self.record_failure(&e.to_string(), Value::Null, payment_ref, err).await);
            },
        };
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                let err = GatewayError::RequestError(e.to_string());
                return Err(self.record_failure(&e.to_string(), Value::Null, payment_ref, err).await);
            },
        };
        let data = match serde_json::from_str::<Value>(&body) {
            Ok(v) => v,
            Err(_) => {
                let detail = serde_json::json!({ "status_code": status, "content": body.clone() });
                let err = GatewayError::UnparseableResponse { body };
                return Err(self
                    .record_failure("Could not parse JSON content from response", detail, payment_ref, err)
                    .await);
            },
        };
        if status != 200 {
            let detail = serde_json::json!({ "status_code": status, "content": body.clone(), "data": data.clone() });
            let err = GatewayError::InvalidResponse { status, body, data };
            return Err(self.record_failure("Invalid API response", detail, payment_ref, err).await);
        }
        trace!("🔌️ PayGate response: {data}");
        Ok(data)
    }

    /// Persist an audit record for a failed exchange, then hand the error back for propagation.
    async fn record_failure(
        &self,
        message: &str,
        detail: Value,
        payment_ref: Option<&PaymentRef>,
        err: GatewayError,
    ) -> GatewayError {
        let entry = self.audit.record_response(NewProcessorResponse::failure(message, detail, payment_ref)).await;
        match (payment_ref, entry) {
            (Some(r), Some(id)) => error!("🔌️ Failed request to PayGate API for [{r}], stored in audit entry [{id}]."),
            (Some(r), None) => error!("🔌️ Failed request to PayGate API for [{r}]. {err}"),
            (None, _) => error!("🔌️ Failed request to PayGate API. {err}"),
        }
        err
    }

    fn required<T>(value: Option<T>, field: &str, data: &Value) -> Result<T, GatewayError> {
        value.ok_or_else(|| GatewayError::MissingField { field: field.to_string(), data: data.clone() })
    }
}

impl<R> GatewayApi for PayGateApi<R>
where R: AuditSink
{
    async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutSuccess, GatewayError> {
        let payment_ref = request.payment_ref.clone();
        info!("🔌️ Starting PayGate checkout for [{payment_ref}], amount {}", request.total_amount);
        let wire = CheckoutWireRequest {
            access_token: self.config.access_token.reveal().clone(),
            merchant_code: self.config.merchant_code.clone(),
            is_recurrent: false,
            client_name: request.client_name,
            email: request.email,
            language: request.language,
            payment_ref: request.payment_ref,
            transaction_desc: request.transaction_desc,
            currency: request.currency,
            total_amount: request.total_amount,
            payment_types: self.config.payment_types.clone(),
            callback_success_url: request.callback_urls.success,
            callback_cancel_url: request.callback_urls.cancel,
            callback_failure_url: request.callback_urls.failure,
            callback_server_url: request.callback_urls.server,
            callback_server_parms: request.server_params,
        };
        let payload = serde_json::to_value(&wire).map_err(|e| GatewayError::RequestError(e.to_string()))?;
        let data =
            self.call_api(&self.config.api_checkout_url, payload, self.config.checkout_timeout, Some(&payment_ref)).await?;
        let parsed = serde_json::from_value::<CheckoutWireResponse>(data.clone())
            .map_err(|_| GatewayError::UnparseableResponse { body: data.to_string() })?;
        let success = Self::required(parsed.success, "Success", &data)?;
        if !success {
            let return_code = parsed.return_code.unwrap_or_default();
            let short_message = parsed.short_return_message.unwrap_or_default();
            let long_message = parsed.long_return_message.unwrap_or_default();
            warn!(
                "🔌️ PayGate checkout not successful for [{payment_ref}]: payment_id={:?} code={return_code} \
                 short={short_message} long={long_message}",
                parsed.payment_id
            );
            return Err(self
                .record_failure(
                    "Not success",
                    data,
                    Some(&payment_ref),
                    GatewayError::CheckoutRejected { return_code, short_message, long_message },
                )
                .await);
        }
        let payment_page_url = Self::required(parsed.url, "URL", &data)?;
        let session_token = Self::required(parsed.session_token, "SessionToken", &data)?;
        self.audit
            .record_response(NewProcessorResponse::new(
                Some(payment_ref.clone()),
                Some(payment_ref.to_string()),
                data,
            ))
            .await;
        info!("🔌️ Checkout for [{payment_ref}] obtained PayGate payment id {:?}", parsed.payment_id);
        Ok(CheckoutSuccess { payment_page_url, session_token, payment_id: parsed.payment_id })
    }

    async fn search_transactions(&self, filter: TransactionSearch) -> Result<Vec<GatewayTransaction>, GatewayError> {
        let payment_ref = filter.payment_ref.clone();
        let wire = SearchWireRequest {
            access_token: self.config.access_token.reveal().clone(),
            merchant_code: self.config.merchant_code.clone(),
            payment_ref: filter.payment_ref,
            status_code: filter.status_code,
            from_datetime: filter.from_datetime.map(|dt| dt.to_rfc3339()),
            to_datetime: filter.to_datetime.map(|dt| dt.to_rfc3339()),
            sort_direction: "ASC".to_string(),
            sort_column: "PAYMENT_REF".to_string(),
            next_rows: filter.next_rows,
            offset_rows: filter.offset_rows,
        };
        let payload = serde_json::to_value(&wire).map_err(|e| GatewayError::RequestError(e.to_string()))?;
        let data = self
            .call_api(
                &self.config.api_back_search_transactions_url,
                payload,
                self.config.search_timeout,
                payment_ref.as_ref(),
            )
            .await?;
        let rows = serde_json::from_value::<Vec<GatewayTransaction>>(data.clone())
            .map_err(|_| GatewayError::UnparseableResponse { body: data.to_string() })?;
        debug!("🔌️ Transaction search returned {} row(s)", rows.len());
        Ok(rows)
    }

    async fn mark_test_payment_as_paid(&self, payment_ref: &PaymentRef) -> bool {
        let payload = serde_json::json!({
            "ACCESS_TOKEN": self.config.access_token.reveal(),
            "MERCHANT_CODE": self.config.merchant_code,
            "PAYMENT_REF": payment_ref,
        });
        match self
            .call_api(
                &self.config.mark_test_payment_as_paid_url,
                payload,
                self.config.mark_test_payment_as_paid_timeout,
                Some(payment_ref),
            )
            .await
        {
            Ok(_) => {
                info!("🔌️ Marked test payment [{payment_ref}] as paid on PayGate");
                true
            },
            Err(e) => {
                warn!("🔌️ Gateway error while marking test payment [{payment_ref}] as paid: {e}");
                false
            },
        }
    }
}

#[cfg(test)]
mod test {
    use pgp_common::PaymentRef;

    use crate::data_objects::{GatewayTransaction, TransactionSearch};

    #[test]
    fn single_ref_search_requests_two_rows() {
        let filter = TransactionSearch::completed_by_ref(&PaymentRef::new("EDX-100001"));
        assert_eq!(filter.next_rows, 2);
        assert_eq!(filter.offset_rows, 0);
        assert_eq!(filter.status_code.as_deref(), Some("C"));
        assert!(filter.from_datetime.is_none());
    }

    #[test]
    fn transaction_amount_is_decimal_exact() {
        let tx: GatewayTransaction = serde_json::from_value(serde_json::json!({
            "MERCHANT_CODE": "NAU",
            "STATUS_CODE": "C",
            "PAYMENT_REF": "EDX-100001",
            "PAYMENT_AMOUNT": "20.00",
            "TRANSACTION_ID": "TX-1",
            "PAYMENT_TYPE_CODE": "REFMB",
        }))
        .unwrap();
        assert_eq!(tx.payment_amount.value(), 2000);
        assert_eq!(tx.payment_amount.to_string(), "20.00");
        assert!(tx.is_completed());
        assert!(tx.card_masked_pan.is_none());
    }
}
