use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One delivered record, as seen by a progress observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayProgress {
    /// 1-based position of the record in the scenario.
    #[serde(rename = "rec")]
    pub record_index: usize,
    #[serde(rename = "total")]
    pub total_records: usize,
    /// The `@timestamp` the record was sent with.
    #[serde(rename = "timestamp")]
    pub emitted_timestamp: i64,
    /// Deliveries that have failed so far in this replay.
    #[serde(rename = "failed", default)]
    pub failed_deliveries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayOutcome {
    Completed,
    Failed,
    Cancelled,
}

/// Final frame of every replay stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub status: ReplayOutcome,
    pub delivered: usize,
    pub failed: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplaySummary {
    pub(crate) fn failed_to_load(error: impl Into<String>) -> Self {
        Self {
            status: ReplayOutcome::Failed,
            delivered: 0,
            failed: 0,
            total: 0,
            error: Some(error.into()),
        }
    }
}

/// What travels over a replay's progress channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplayFrame {
    Progress(ReplayProgress),
    Summary(ReplaySummary),
}

impl ReplayFrame {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReplayFrame::Summary(_))
    }
}

/// Lifecycle of a single replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayState {
    #[default]
    Idle,
    Loading,
    Streaming,
    Completed,
    Aborted,
}

impl ReplayState {
    pub fn is_finished(self) -> bool {
        matches!(self, ReplayState::Completed | ReplayState::Aborted)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayCounters {
    pub state: ReplayState,
    pub delivered: usize,
    pub failed: usize,
    pub total: usize,
}

/// Shared view of a running replay's state and counters.
#[derive(Debug, Clone, Default)]
pub struct ReplayMonitor(Arc<Mutex<ReplayCounters>>);

impl ReplayMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> ReplayCounters {
        *self.0.lock()
    }

    pub fn state(&self) -> ReplayState {
        self.0.lock().state
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut ReplayCounters)) {
        f(&mut self.0.lock());
    }
}
