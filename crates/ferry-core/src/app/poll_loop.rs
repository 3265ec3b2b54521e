//! PollLoop - 1 サイクル = load → read → advance → sweep → transfer → save
//!
//! ログが読めないサイクルでも sweep / transfer / save は実行する
//! （以前 CLOSED になったファイルは先に進める）。

use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, debug, info, info_span};

use crate::error::FerryError;
use crate::lifecycle::LifecycleMachine;
use crate::logs::{InstrumentProfile, LogRead, LogSource};
use crate::observability::CycleReport;
use crate::ports::{Clock, Transport};
use crate::queue::{QueueStore, RetentionPolicy};

use super::transfer::TransferExecutor;

/// Drives the whole daemon, one cycle at a time.
pub struct PollLoop {
    pub(crate) source: Arc<dyn LogSource>,
    pub(crate) store: Arc<dyn QueueStore>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) profile: InstrumentProfile,
    pub(crate) retention: RetentionPolicy,
    pub(crate) interval: Duration,
}

impl PollLoop {
    pub fn profile(&self) -> &InstrumentProfile {
        &self.profile
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn store(&self) -> &dyn QueueStore {
        self.store.as_ref()
    }

    /// Run one cycle and persist the result.
    ///
    /// On `Err` nothing from this cycle has been saved.
    pub async fn run_cycle(&self) -> Result<CycleReport, FerryError> {
        let now = self.clock.now();
        let span = info_span!("cycle", at = %now);
        self.cycle_at(now).instrument(span).await
    }

    async fn cycle_at(&self, now: chrono::NaiveDateTime) -> Result<CycleReport, FerryError> {
        let mut queue = self.store.load()?;
        let watermark = queue.watermark();
        debug!(entries = queue.len(), watermark = ?watermark, "queue loaded");

        let advance = match self.source.read_after(watermark, now).await {
            LogRead::Events(events) => {
                let machine = LifecycleMachine::new(&self.profile, self.retention);
                Some(machine.advance(&mut queue, &events, now))
            }
            LogRead::Unavailable { reason } => {
                info!(%reason, "instrument log unavailable; skipping state update");
                None
            }
        };

        let swept = self.retention.sweep(&mut queue, now).len();
        let transfer = TransferExecutor::new(self.transport.as_ref()).run(&mut queue, now).await?;

        self.store.save(&queue)?;

        let report = CycleReport {
            advance,
            swept,
            transfer,
            counts: queue.counts(),
        };
        info!(
            open = report.counts.open,
            acquisition_stopped = report.counts.acquisition_stopped,
            closed = report.counts.closed,
            done = report.counts.done,
            "cycle finished"
        );
        Ok(report)
    }

    /// Cycle forever. Returns only with a fatal error.
    pub async fn run(&self) -> Result<(), FerryError> {
        info!(
            instrument = %self.profile.name,
            interval_secs = self.interval.as_secs(),
            "poll loop started"
        );
        loop {
            self.run_cycle().await?;
            tokio::time::sleep(self.interval).await;
        }
    }
}
