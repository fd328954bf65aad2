use std::time::Duration;

use log::*;
use tokio::task::JoinHandle;

use crate::routes::Ingest;

/// Starts the polling fallback. Do not await the returned JoinHandle, as it runs
/// indefinitely.
pub fn start_poll_worker(api: Ingest, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        // The first tick fires immediately. Skip it so startup is not a thundering
        // herd of marketplace calls.
        timer.tick().await;
        info!("🔁️ Order polling worker started (every {}s)", interval.as_secs());
        loop {
            timer.tick().await;
            match api.poll_orders().await {
                Ok(report) => {
                    info!(
                        "🔁️ Polling pass: {} fetched, {} ingested, {} failed",
                        report.fetched,
                        report.ingested,
                        report.failures.len()
                    );
                },
                Err(e) => error!("🔁️ Polling pass failed. {e}"),
            }
        }
    })
}

/// Starts the lock sweeper, which drops expired processing locks once a minute.
pub fn start_lock_sweeper(api: Ingest) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(Duration::from_secs(60));
        info!("⏳️ Processing-lock sweeper started");
        loop {
            timer.tick().await;
            api.sweep_expired_locks();
        }
    })
}
