//! Refresh trigger: update once when the document is ready, then hourly.
//!
//! Failures are logged and the schedule carries on. Every tick looks the
//! slot up again, so a slot registered late is picked up on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::document::Document;
use crate::scheduler::{self, SchedulerError, TaskHandle};
use crate::updater::GreetingUpdater;

/// Stock refresh period: one hour.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_millis(3_600_000);

/// Starts the periodic greeting refresh.
#[derive(Debug, Clone, Copy)]
pub struct GreetingScheduler;

impl GreetingScheduler {
    /// Spawn the refresh task.
    ///
    /// The task waits for `document` to become ready, runs one update
    /// immediately, then one every `period`. Each update's reveal runs as
    /// its own detached task, so a slow reveal never delays the schedule.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ZeroPeriod`] if `period` is zero.
    pub fn start(
        updater: Arc<GreetingUpdater>,
        document: Arc<Document>,
        period: Duration,
    ) -> Result<TaskHandle, SchedulerError> {
        info!(
            slot_id = updater.slot_id(),
            period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            "Greeting refresh scheduled"
        );
        let gate = async move { document.ready().await };
        scheduler::spawn_every("greeting-refresh", period, gate, move || {
            run_update(&updater);
            std::future::ready(())
        })
    }
}

fn run_update(updater: &GreetingUpdater) {
    match updater.trigger() {
        Ok(pending) => {
            let report = pending.detach();
            info!(
                transition = %report.transition,
                slot_id = %report.slot_id,
                hour = report.hour.get(),
                bucket = %report.bucket,
                "Greeting update started"
            );
        }
        Err(e) => {
            error!(
                slot_id = updater.slot_id(),
                error = %e,
                "Greeting update failed"
            );
        }
    }
}
