use chrono::Utc;
use log::*;
use tokio::task::JoinHandle;

use crate::{config::SweepConfig, server::PaymentServerApi};

/// Starts the reconciliation sweep. Do not await the returned JoinHandle, as it will run
/// indefinitely.
///
/// PayGate retries failed server callbacks for a while, but not forever; a shop that was down for
/// longer than the retry horizon would silently lose orders for payments that went through. The
/// sweep walks the gateway's completed transactions over a trailing window and pushes any that
/// never became orders back through the ordinary notification path.
pub fn start_sweep_worker(api: PaymentServerApi, config: SweepConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(config.interval);
        let window = chrono::Duration::from_std(config.window).unwrap_or_else(|_| chrono::Duration::days(1));
        info!(
            "🕰️ Reconciliation sweep started. Every {}s, looking back {}s.",
            config.interval.as_secs(),
            config.window.as_secs()
        );
        loop {
            timer.tick().await;
            let to = Utc::now();
            let from = to - window;
            info!("🕰️ Sweeping completed gateway transactions from {from} to {to}");
            match api.reconcile_window(from, to, config.page_size).await {
                Ok(summary) => {
                    info!("🕰️ Sweep complete. {summary}");
                },
                Err(e) => {
                    error!("🕰️ Error running reconciliation sweep: {e}");
                },
            }
        }
    })
}
