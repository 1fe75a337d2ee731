use std::{env, str::FromStr, time::Duration};

use log::*;
use paygate_api::PayGateConfig;
use paygate_engine::sqlite::db::db_url;

use crate::helpers::IpNetwork;

const DEFAULT_PGP_HOST: &str = "127.0.0.1";
const DEFAULT_PGP_PORT: u16 = 8380;
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_SWEEP_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Public base url of this server, used to build the callback urls handed
    /// to PayGate. e.g. "https://shop.example.com/paygate"
    pub base_url: String,
    /// Shop page the browser is sent to after a verified payment.
    pub receipt_path: String,
    /// Shop page the browser is sent to after cancelling at the payment page.
    pub cancel_path: String,
    /// Shop page the browser is sent to when something went wrong.
    pub error_path: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address,
    /// rather than the connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If supplied, requests against the server-to-server callback are checked against this list
    /// of networks. When unset the check is skipped, which is only acceptable in development.
    pub callback_allowed_networks: Option<Vec<IpNetwork>>,
    /// Language code sent to the payment page.
    pub language: String,
    /// What the customer sees on the payment page as the payee.
    pub shop_title: String,
    pub paygate: PayGateConfig,
    pub sweep: SweepConfig,
}

/// Settings for the background job that re-checks gateway transactions whose
/// callbacks never landed.
#[derive(Clone, Debug)]
pub struct SweepConfig {
    pub enabled: bool,
    /// Time between sweeps.
    pub interval: Duration,
    /// How far back each sweep looks.
    pub window: Duration,
    /// Transaction search page size. 0 means the client default.
    pub page_size: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { enabled: false, interval: DEFAULT_SWEEP_INTERVAL, window: DEFAULT_SWEEP_WINDOW, page_size: 0 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PGP_HOST.to_string(),
            port: DEFAULT_PGP_PORT,
            database_url: String::default(),
            base_url: format!("http://{DEFAULT_PGP_HOST}:{DEFAULT_PGP_PORT}"),
            receipt_path: "/checkout/receipt/".to_string(),
            cancel_path: "/checkout/cancel-checkout/".to_string(),
            error_path: "/checkout/error/".to_string(),
            use_x_forwarded_for: false,
            callback_allowed_networks: None,
            language: "en".to_string(),
            shop_title: "Webshop".to_string(),
            paygate: PayGateConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PGP_HOST").ok().unwrap_or_else(|| DEFAULT_PGP_HOST.into());
        let port = env::var("PGP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for PGP_PORT. {e} Using the default instead.");
                    DEFAULT_PGP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PGP_PORT);
        let database_url = db_url();
        let base_url = env::var("PGP_BASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ PGP_BASE_URL is not set. Callback urls given to PayGate will point at localhost.");
            format!("http://{host}:{port}")
        });
        let receipt_path = env::var("PGP_RECEIPT_PATH").ok().unwrap_or_else(|| "/checkout/receipt/".into());
        let cancel_path = env::var("PGP_CANCEL_PATH").ok().unwrap_or_else(|| "/checkout/cancel-checkout/".into());
        let error_path = env::var("PGP_ERROR_PATH").ok().unwrap_or_else(|| "/checkout/error/".into());
        let use_x_forwarded_for =
            env::var("PGP_USE_X_FORWARDED_FOR").map(|s| &s == "1" || s.to_lowercase() == "true").unwrap_or(false);
        let callback_allowed_networks = configure_allow_list();
        let language = env::var("PGP_LANGUAGE").ok().unwrap_or_else(|| "en".into());
        let shop_title = env::var("PGP_SHOP_TITLE").ok().unwrap_or_else(|| "Webshop".into());
        Self {
            host,
            port,
            database_url,
            base_url,
            receipt_path,
            cancel_path,
            error_path,
            use_x_forwarded_for,
            callback_allowed_networks,
            language,
            shop_title,
            paygate: PayGateConfig::from_env_or_default(),
            sweep: SweepConfig::from_env_or_default(),
        }
    }

    /// Absolute url of a path on this server.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

impl SweepConfig {
    pub fn from_env_or_default() -> Self {
        let enabled = env::var("PGP_SWEEP_ENABLED")
            .map(|s| &s == "1" || s.to_lowercase() == "true")
            .unwrap_or(false);
        let interval = seconds_from_env("PGP_SWEEP_INTERVAL", DEFAULT_SWEEP_INTERVAL);
        let window = seconds_from_env("PGP_SWEEP_WINDOW", DEFAULT_SWEEP_WINDOW);
        let page_size = env::var("PGP_SWEEP_PAGE_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for PGP_SWEEP_PAGE_SIZE. {e} Using the default instead.");
                        e
                    })
                    .ok()
            })
            .unwrap_or(0);
        Self { enabled, interval, window, page_size }
    }
}

fn seconds_from_env(var: &str, default: Duration) -> Duration {
    env::var(var)
        .ok()
        .and_then(|s| {
            s.parse::<u64>()
                .map_err(|e| {
                    error!("🪛️ {s} is not a valid number of seconds for {var}. {e} Using the default instead.");
                    e
                })
                .ok()
        })
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Read the callback IP allow-list from `PGP_CALLBACK_SERVER_ALLOWED_NETWORKS`. A comma-separated
/// list of addresses or CIDR networks. "none", "false" or "0" explicitly disables the check.
fn configure_allow_list() -> Option<Vec<IpNetwork>> {
    let raw = env::var("PGP_CALLBACK_SERVER_ALLOWED_NETWORKS").ok()?;
    match raw.trim().to_lowercase().as_str() {
        "" | "none" | "false" | "0" => None,
        _ => {
            let networks = raw
                .split(',')
                .filter_map(|s| {
                    IpNetwork::from_str(s.trim())
                        .map_err(|e| error!("🪛️ Ignoring allow-list entry. {e}"))
                        .ok()
                })
                .collect::<Vec<IpNetwork>>();
            if networks.is_empty() {
                warn!("🪛️ PGP_CALLBACK_SERVER_ALLOWED_NETWORKS contained no valid networks. The check is disabled.");
                None
            } else {
                Some(networks)
            }
        },
    }
}
