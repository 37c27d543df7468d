//! Repeating runs on a cron schedule using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler (cron, UTC)
//!     │
//!     └─► TrendScout::run()   (skipped while the previous run is still going)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::scout::TrendScout;

/// Cron expression (seconds field first) for a daily run at midnight UTC.
pub const DAILY_AT_MIDNIGHT: &str = "0 0 0 * * *";

/// Start running `scout` on `cron`. The returned scheduler keeps running until
/// it is shut down or dropped with the runtime.
pub async fn start_schedule(cron: &str, scout: Arc<TrendScout>) -> Result<JobScheduler> {
    let running = Arc::new(AtomicBool::new(false));

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let scout = scout.clone();
        let running = running.clone();
        Box::pin(async move {
            run_unless_busy(&scout, &running).await;
        })
    })
    .with_context(|| format!("Invalid schedule: {cron}"))?;

    let scheduler = JobScheduler::new().await?;
    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(cron, "Scheduled trend runs started");
    Ok(scheduler)
}

/// One scheduled tick. Returns `false` when skipped because a run is in flight.
async fn run_unless_busy(scout: &TrendScout, running: &AtomicBool) -> bool {
    let Some(_busy) = BusyFlag::acquire(running) else {
        tracing::warn!("Previous trend run still in progress, skipping this tick");
        return false;
    };
    match scout.run().await {
        Ok(report) => tracing::info!("{}", report.stats),
        Err(e) => tracing::error!(error = %e, "Scheduled trend run failed"),
    }
    true
}

/// Holds the in-progress flag; clears it on drop, including on unwind.
struct BusyFlag<'a>(&'a AtomicBool);

impl<'a> BusyFlag<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
