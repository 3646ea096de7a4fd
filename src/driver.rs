//! Periodic export task
//!
//! Runs one export cycle per tick until cancelled. A failed cycle is logged
//! and the loop keeps going; the next tick starts from the unchanged
//! checkpoint.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::ColdError;
use crate::exporter::ColdEventExporter;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// What a driver did before it stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverReport {
    /// Cycles attempted
    pub cycles: u64,
    /// Cycles that returned an error
    pub failures: u64,
    /// Events archived across all cycles
    pub exported_events: u64,
}

/// Calls the exporter once per `interval` for one service
pub struct ExportDriver {
    exporter: Arc<dyn ColdEventExporter>,
    service_id: String,
    interval: Duration,
}

impl ExportDriver {
    pub fn new(
        exporter: Arc<dyn ColdEventExporter>,
        service_id: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            exporter,
            service_id: service_id.into(),
            interval,
        }
    }

    /// Run on the current runtime until `cancel` fires
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<DriverReport> {
        tokio::spawn(self.run(cancel))
    }

    /// Tick until `cancel` fires
    ///
    /// Returns at once when the tier is unsupported or disabled, since every
    /// cycle would fail the same way.
    pub async fn run(self, cancel: CancellationToken) -> DriverReport {
        let mut report = DriverReport::default();

        let status = self.exporter.status();
        if !status.is_supported || !status.is_enabled {
            info!(service_id = %self.service_id, reason = %status.reason, "export driver not started");
            return report;
        }

        info!(
            service_id = %self.service_id,
            interval_secs = self.interval.as_secs_f64(),
            "export driver started"
        );

        let mut ticker = interval(self.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                _ = ticker.tick() => {
                    report.cycles += 1;
                    match self.exporter.export_incremental(&self.service_id, &cancel).await {
                        Ok(result) => {
                            report.exported_events += result.exported_event_count as u64;
                            debug!(
                                service_id = %self.service_id,
                                events = result.exported_event_count,
                                "export cycle finished"
                            );
                        }
                        Err(ColdError::Cancelled) => break,
                        Err(e) if e.is_transient() => {
                            report.failures += 1;
                            warn!(service_id = %self.service_id, error = %e, "export cycle failed");
                        }
                        Err(e) => {
                            report.failures += 1;
                            error!(service_id = %self.service_id, error = %e, "export cycle failed");
                        }
                    }
                }
            }
        }

        info!(
            service_id = %self.service_id,
            cycles = report.cycles,
            failures = report.failures,
            "export driver stopped"
        );
        report
    }
}
