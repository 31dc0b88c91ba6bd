//! Periodic mark expiry.
//!
//! The mark store keeps every recorded occurrence until this scheduler
//! sweeps it; the sweep deletes marks older than the global retention
//! horizon, independent of per-key window lengths.

use crate::actor::EngineHandle;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawn the expiry scheduler.
///
/// Every `interval`, asks the engine actor to purge marks older than its
/// retention horizon. Purge failures are logged and never fatal.
pub fn spawn(engine: EngineHandle, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so sweeps start one
        // full interval after startup
        ticker.tick().await;

        loop {
            ticker.tick().await;
            tracing::debug!("starting mark expiry");
            match engine.purge().await {
                Ok(purged) => tracing::debug!(purged, "mark expiry finished"),
                Err(e) => tracing::error!("mark expiry failed: {e}"),
            }
        }
    })
}
