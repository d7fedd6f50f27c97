//! Sync loop and shared counters.
//!
//! The runner owns the engine. Each iteration runs one cycle, folds the
//! [`CycleReport`] into [`SyncMetrics`], saves state, then sleeps until the
//! next poll or shutdown.

use crate::error::Result;
use crate::state::save_state;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sync_client::{CycleReport, PageFetcher, Store, SyncEngine};
use tokio::sync::watch;

/// Counters shared between the runner and the HTTP endpoints.
///
/// Counters are monotonic since startup; `active_records` is a gauge.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    /// Completed cycles.
    pub cycles_total: AtomicU64,
    /// Records inserted.
    pub inserted_total: AtomicU64,
    /// Records already present.
    pub duplicates_total: AtomicU64,
    /// Deferred records (missing parent or store failure).
    pub deferred_total: AtomicU64,
    /// Active records dropped after vanishing remotely.
    pub dropped_total: AtomicU64,
    /// Fetch failures.
    pub fetch_errors_total: AtomicU64,
    /// Store failures.
    pub store_errors_total: AtomicU64,
    /// Failed dependent actions.
    pub actions_failed_total: AtomicU64,
    /// Records currently awaiting a terminal status.
    pub active_records: AtomicU64,
}

impl SyncMetrics {
    /// Fold one cycle into the counters.
    pub fn record_cycle(&self, report: &CycleReport, active_records: usize) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        self.inserted_total
            .fetch_add(report.inserted(), Ordering::Relaxed);
        self.duplicates_total
            .fetch_add(report.duplicates(), Ordering::Relaxed);
        self.deferred_total
            .fetch_add(report.deferred(), Ordering::Relaxed);
        self.dropped_total.fetch_add(report.dropped(), Ordering::Relaxed);
        self.fetch_errors_total
            .fetch_add(report.fetch_errors(), Ordering::Relaxed);
        self.store_errors_total
            .fetch_add(report.store_errors(), Ordering::Relaxed);
        self.actions_failed_total
            .fetch_add(report.actions_failed(), Ordering::Relaxed);
        self.active_records
            .store(active_records as u64, Ordering::Relaxed);
    }
}

/// Runner settings.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Pause between cycles.
    pub poll_interval: Duration,
    /// Stop after the first cycle.
    pub one_shot: bool,
    /// Where to save engine state after each cycle.
    pub state_file: Option<PathBuf>,
}

/// Drives the engine until shutdown.
pub struct Runner<F, S> {
    engine: SyncEngine<F, S>,
    metrics: Arc<SyncMetrics>,
    config: RunnerConfig,
}

impl<F: PageFetcher, S: Store> Runner<F, S> {
    /// Create a runner.
    pub fn new(engine: SyncEngine<F, S>, metrics: Arc<SyncMetrics>, config: RunnerConfig) -> Self {
        Self {
            engine,
            metrics,
            config,
        }
    }

    /// Engine driven by this runner.
    pub fn engine(&self) -> &SyncEngine<F, S> {
        &self.engine
    }

    /// Loop until `shutdown` flips to true (or after one cycle in one-shot
    /// mode). Returns the number of cycles run.
    ///
    /// Only a failure to save state ends the loop with an error.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<u64> {
        let mut cycles = 0;
        tracing::info!(
            interval_secs = self.config.poll_interval.as_secs(),
            one_shot = self.config.one_shot,
            "Sync loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.engine.run_cycle().await;
            cycles += 1;
            let active = self.engine.state().total_active();
            self.metrics.record_cycle(&report, active);

            tracing::info!(
                cycle = cycles,
                inserted = report.inserted(),
                duplicates = report.duplicates(),
                deferred = report.deferred(),
                dropped = report.dropped(),
                fetch_errors = report.fetch_errors(),
                active,
                "Cycle complete"
            );

            if let Some(path) = &self.config.state_file {
                save_state(path, self.engine.state()).await?;
            }

            if self.config.one_shot || report.interrupted {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!(cycles, "Sync loop stopped");
        Ok(cycles)
    }
}
