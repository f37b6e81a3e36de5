//! Background scheduler for the periodic import run.
//!
//! No cancellation: a scheduled run completes or times out via the
//! per-user time budget inside the import service. Missed work is safe
//! to pick up next tick because the importer is idempotent.

use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::SharedState;

pub fn spawn_scheduler(
    state: SharedState,
    sync_interval: Duration,
    initial_delay: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(initial_delay).await;
        let mut ticker = interval(sync_interval);
        loop {
            ticker.tick().await;
            info!("Scheduled import sync starting");
            match state.ctx.import_service.run_sync().await {
                Ok(summary) => info!(
                    imported = summary.imported(),
                    skipped = summary.skipped(),
                    users = summary.users.len(),
                    "Scheduled sync finished"
                ),
                // Only a failure that prevented the run from starting at
                // all lands here; everything else is folded into counters.
                Err(err) => warn!("Scheduled sync could not start: {}", err),
            }
        }
    })
}
