//! # Periodic Sweeps
//!
//! Background task that resets expired pinned ads to Basic and purges stale
//! quick-apply tokens on a fixed tick. Each sweep is a handful of batch
//! statements, so running several instances at once is harmless.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tokio::time::{Duration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::apply::QuickApply;
use crate::config::AppConfig;
use crate::error::BoardResult;
use crate::lifecycle::{AdLifecycle, DemotionReport};

/// What one sweep changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub demoted: DemotionReport,
    pub apply_tokens_removed: u64,
}

/// Background sweep service.
pub struct Sweeper {
    config: Arc<AppConfig>,
    lifecycle: AdLifecycle,
    quick_apply: QuickApply,
}

impl Sweeper {
    pub fn new(config: Arc<AppConfig>, lifecycle: AdLifecycle, quick_apply: QuickApply) -> Self {
        Self {
            config,
            lifecycle,
            quick_apply,
        }
    }

    /// Run the sweep loop until the provided shutdown token fires.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Starting sweeper");
        let tick_interval = Duration::from_secs(self.config.sweeper.tick_interval_seconds);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Sweeper shutdown requested");
                    break;
                }
                _ = sleep(tick_interval) => {
                    let tick_started = Instant::now();
                    if let Err(err) = self.sweep(Utc::now()).await {
                        counter!("jobboard_sweep_failures_total").increment(1);
                        error!(error = ?err, "Sweep failed");
                    }
                    histogram!("jobboard_sweep_duration_ms")
                        .record(tick_started.elapsed().as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Sweeper stopped");
    }

    /// Run every sweep once as of `now`.
    pub async fn sweep(&self, now: DateTime<Utc>) -> BoardResult<SweepReport> {
        let demoted = self.lifecycle.demote_expired(now).await?;
        let apply_tokens_removed = self.quick_apply.cleanup_expired(now).await?;

        gauge!("jobboard_sweep_last_demoted").set(demoted.total() as f64);
        counter!("jobboard_apply_tokens_removed_total").increment(apply_tokens_removed);

        debug!(
            demoted_30_days = demoted.pinned_30_days,
            demoted_7_days = demoted.pinned_7_days,
            apply_tokens_removed,
            "Sweep completed"
        );

        Ok(SweepReport {
            demoted,
            apply_tokens_removed,
        })
    }
}
