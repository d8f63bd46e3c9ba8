//! The queue-tick loop.

use crate::message::TickableQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Tick the queue at a fixed interval until the shutdown token fires.
///
/// Exits promptly on cancellation; messages stranded in the queue are
/// recovered by reconciliation on the next start.
pub fn spawn_queue_ticker(
    queue: Arc<dyn TickableQueue>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("queue ticker stopped");
                    return;
                }
                _ = ticker.tick() => {
                    queue.tick().await;
                }
            }
        }
    })
}
