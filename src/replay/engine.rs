use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::scenario::Scenario;
use crate::shape::as_millis;
use crate::util::now_ms;
use crate::TIMESTAMP_FIELD;

use super::progress::{
    ReplayFrame, ReplayMonitor, ReplayOutcome, ReplayProgress, ReplayState, ReplaySummary,
};
use super::sink::IngestSink;

/// Re-anchor a stored offset to a replay that starts at `t0`.
///
/// A record must never appear to have been sent before the replay began, so
/// results earlier than `t0` are clamped to `t0`.
pub fn emit_time(t0: i64, offset: i64) -> i64 {
    let emit = t0.saturating_sub(offset);
    if emit < t0 {
        warn!(
            t0,
            offset,
            computed = emit,
            "emit time precedes replay start, clamping"
        );
        return t0;
    }
    emit
}

/// Sends a scenario's records to a sink one at a time, in order, reporting
/// each delivery on a progress channel.
pub struct ReplayEngine {
    sink: Arc<dyn IngestSink>,
    monitor: ReplayMonitor,
    start_time: Option<i64>,
}

impl ReplayEngine {
    pub fn new(sink: Arc<dyn IngestSink>) -> Self {
        Self {
            sink,
            monitor: ReplayMonitor::new(),
            start_time: None,
        }
    }

    pub fn with_monitor(mut self, monitor: ReplayMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// Pin the replay start instead of reading the wall clock when streaming
    /// begins.
    pub fn with_start_time(mut self, t0_ms: i64) -> Self {
        self.start_time = Some(t0_ms);
        self
    }

    pub fn monitor(&self) -> &ReplayMonitor {
        &self.monitor
    }

    /// Load the artifact at `path` and stream it.
    ///
    /// The progress channel closes when this returns. The last frame sent is
    /// always a [`ReplaySummary`].
    pub async fn run(
        &self,
        path: &Path,
        progress: mpsc::Sender<ReplayFrame>,
        cancel: CancellationToken,
    ) -> ReplaySummary {
        self.monitor.update(|c| c.state = ReplayState::Loading);

        let loaded = match tokio::fs::read(path).await {
            Ok(bytes) => Scenario::from_slice(&bytes).map_err(|e| e.to_string()),
            Err(e) => Err(format!("{}: {e}", path.display())),
        };

        match loaded {
            Ok(scenario) => self.stream(scenario, progress, cancel).await,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "failed to load scenario");
                self.monitor.update(|c| c.state = ReplayState::Aborted);
                let summary = ReplaySummary::failed_to_load(error);
                finish(&progress, &summary, &cancel).await;
                summary
            }
        }
    }

    /// Stream an already loaded scenario.
    pub async fn stream(
        &self,
        scenario: Scenario,
        progress: mpsc::Sender<ReplayFrame>,
        cancel: CancellationToken,
    ) -> ReplaySummary {
        let t0 = self.start_time.unwrap_or_else(now_ms);
        let events = scenario.into_events();
        let total = events.len();

        self.monitor.update(|c| {
            c.state = ReplayState::Streaming;
            c.total = total;
        });
        info!(t0, total, "replay streaming");

        let mut delivered = 0;
        let mut failed = 0;
        let mut cancelled = false;

        for (index, mut record) in events.into_iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let offset = record.get(TIMESTAMP_FIELD).and_then(as_millis).unwrap_or(0);
            let emitted = emit_time(t0, offset);
            record.insert(TIMESTAMP_FIELD.to_string(), Value::from(emitted));

            if let Err(err) = self.sink.deliver(&record).await {
                failed += 1;
                warn!(record = index + 1, error = %err, "delivery failed, skipping record");
                self.monitor.update(|c| c.failed = failed);
                continue;
            }

            delivered += 1;
            self.monitor.update(|c| c.delivered = delivered);

            let frame = ReplayFrame::Progress(ReplayProgress {
                record_index: index + 1,
                total_records: total,
                emitted_timestamp: emitted,
                failed_deliveries: failed,
            });

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                sent = progress.send(frame) => {
                    if sent.is_err() {
                        debug!(record = index + 1, "progress observer gone");
                    }
                }
            }
        }

        let status = if cancelled {
            info!(delivered, failed, total, "replay cancelled");
            self.monitor.update(|c| c.state = ReplayState::Aborted);
            ReplayOutcome::Cancelled
        } else {
            info!(delivered, failed, total, "replay completed");
            self.monitor.update(|c| c.state = ReplayState::Completed);
            ReplayOutcome::Completed
        };

        let summary = ReplaySummary {
            status,
            delivered,
            failed,
            total,
            error: None,
        };
        finish(&progress, &summary, &cancel).await;
        summary
    }
}

/// Send the terminal frame. After cancellation nobody may be reading, so the
/// frame is only offered, never waited on.
async fn finish(
    progress: &mpsc::Sender<ReplayFrame>,
    summary: &ReplaySummary,
    cancel: &CancellationToken,
) {
    let frame = ReplayFrame::Summary(summary.clone());
    if cancel.is_cancelled() {
        let _ = progress.try_send(frame);
        return;
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {}
        _ = progress.send(frame) => {}
    }
}
