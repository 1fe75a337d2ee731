use std::{env, time::Duration};

use log::*;
use pgp_common::Secret;

// The defaults point at the vendor's lab environment, which is useless in production but makes
// local development work out of the box.
const DEFAULT_API_CHECKOUT_URL: &str = "https://lab.optimistic.blue/paygateWS/api/CheckOut";
const DEFAULT_API_BACK_SEARCH_TRANSACTIONS_URL: &str =
    "https://lab.optimistic.blue/paygateWS/api/BackOfficeSearchTransactions";
const DEFAULT_MARK_TEST_PAYMENT_AS_PAID_URL: &str = "https://lab.optimistic.blue/paygateWS/api/MarkTestPaymentAsPaid";

const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_PAYMENT_TYPES: [&str; 7] = ["VISA", "MASTERCARD", "AMEX", "PAYPAL", "MBWAY", "REFMB", "DUC"];

/// Per-site PayGate connection settings. Everything here is read-only once the client is
/// constructed, so the config is safe to share between concurrent requests.
#[derive(Debug, Clone)]
pub struct PayGateConfig {
    /// The merchant access token embedded in every request body.
    pub access_token: Secret<String>,
    /// The merchant code PayGate knows us by. Also used to double-check search results.
    pub merchant_code: String,
    pub api_basic_auth_user: String,
    pub api_basic_auth_pass: Secret<String>,
    pub api_checkout_url: String,
    pub api_back_search_transactions_url: String,
    pub mark_test_payment_as_paid_url: String,
    pub checkout_timeout: Duration,
    pub search_timeout: Duration,
    pub mark_test_payment_as_paid_timeout: Duration,
    /// The payment methods offered to the user on the hosted payment page.
    pub payment_types: Vec<String>,
}

impl Default for PayGateConfig {
    fn default() -> Self {
        Self {
            access_token: Secret::default(),
            merchant_code: String::default(),
            api_basic_auth_user: String::default(),
            api_basic_auth_pass: Secret::default(),
            api_checkout_url: DEFAULT_API_CHECKOUT_URL.to_string(),
            api_back_search_transactions_url: DEFAULT_API_BACK_SEARCH_TRANSACTIONS_URL.to_string(),
            mark_test_payment_as_paid_url: DEFAULT_MARK_TEST_PAYMENT_AS_PAID_URL.to_string(),
            checkout_timeout: DEFAULT_API_TIMEOUT,
            search_timeout: DEFAULT_API_TIMEOUT,
            mark_test_payment_as_paid_timeout: DEFAULT_API_TIMEOUT,
            payment_types: DEFAULT_PAYMENT_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PayGateConfig {
    pub fn from_env_or_default() -> Self {
        let access_token = Secret::new(env::var("PGP_PAYGATE_ACCESS_TOKEN").unwrap_or_else(|_| {
            error!("🔌️ PGP_PAYGATE_ACCESS_TOKEN is not set. PayGate will reject every call we make.");
            String::default()
        }));
        let merchant_code = env::var("PGP_PAYGATE_MERCHANT_CODE").unwrap_or_else(|_| {
            error!("🔌️ PGP_PAYGATE_MERCHANT_CODE is not set. Payment confirmation cannot succeed without it.");
            String::default()
        });
        let api_basic_auth_user = env::var("PGP_PAYGATE_API_USER").unwrap_or_else(|_| {
            warn!("🔌️ PGP_PAYGATE_API_USER is not set. Requests will be sent without basic authentication.");
            String::default()
        });
        let api_basic_auth_pass = Secret::new(env::var("PGP_PAYGATE_API_PASS").unwrap_or_default());
        let api_checkout_url = url_from_env("PGP_PAYGATE_CHECKOUT_URL", DEFAULT_API_CHECKOUT_URL);
        let api_back_search_transactions_url =
            url_from_env("PGP_PAYGATE_SEARCH_TRANSACTIONS_URL", DEFAULT_API_BACK_SEARCH_TRANSACTIONS_URL);
        let mark_test_payment_as_paid_url =
            url_from_env("PGP_PAYGATE_MARK_TEST_PAYMENT_AS_PAID_URL", DEFAULT_MARK_TEST_PAYMENT_AS_PAID_URL);
        let checkout_timeout = timeout_from_env("PGP_PAYGATE_CHECKOUT_TIMEOUT");
        let search_timeout = timeout_from_env("PGP_PAYGATE_SEARCH_TIMEOUT");
        let mark_test_payment_as_paid_timeout = timeout_from_env("PGP_PAYGATE_MARK_TEST_PAYMENT_AS_PAID_TIMEOUT");
        let payment_types = env::var("PGP_PAYGATE_PAYMENT_TYPES")
            .map(|s| s.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect::<Vec<_>>())
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_TYPES.iter().map(|s| s.to_string()).collect());
        Self {
            access_token,
            merchant_code,
            api_basic_auth_user,
            api_basic_auth_pass,
            api_checkout_url,
            api_back_search_transactions_url,
            mark_test_payment_as_paid_url,
            checkout_timeout,
            search_timeout,
            mark_test_payment_as_paid_timeout,
            payment_types,
        }
    }
}

fn url_from_env(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| {
        info!("🔌️ {var} is not set. Using the PayGate lab environment default, {default}.");
        default.to_string()
    })
}

fn timeout_from_env(var: &str) -> Duration {
    env::var(var)
        .ok()
        .and_then(|s| {
            s.parse::<u64>()
                .map_err(|e| warn!("🔌️ Ignoring invalid value for {var}: {e}. Using the default."))
                .ok()
        })
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_API_TIMEOUT)
}
