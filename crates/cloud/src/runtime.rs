//! The cloud's long-lived loops.
//!
//! Two loops drive the cloud side: the queue ticker (shared helper in
//! `gantry-queue`) and the repair scanner below. Both run until the
//! shutdown token fires and exit promptly when it does.

use crate::services::EventualConsistencyWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub use gantry_queue::spawn_queue_ticker;

/// Run the reconciliation scan at a fixed interval until shutdown.
pub fn spawn_repair_scanner(
    worker: Arc<EventualConsistencyWorker>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick fires immediately; skip it so the scan
        // cadence starts one interval after boot.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("repair scanner stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(error) = worker.scan().await {
                        tracing::error!(%error, "repair scan failed");
                    }
                }
            }
        }
    })
}
