use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::config::ReplaySettings;

use super::engine::ReplayEngine;
use super::progress::{ReplayFrame, ReplayMonitor, ReplayState};
use super::sink::IngestSink;

/// Finished sessions kept around for status lookups.
const RETAINED_FINISHED: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("replay not found: {0}")]
    NotFound(Uuid),

    #[error("replay {0} already has a progress subscriber")]
    AlreadySubscribed(Uuid),

    #[error("too many replays in progress (limit {limit})")]
    Busy { limit: usize },
}

struct ReplaySession {
    scenario: String,
    started_at: DateTime<Utc>,
    monitor: ReplayMonitor,
    cancel: CancellationToken,
    progress: Mutex<Option<mpsc::Receiver<ReplayFrame>>>,
}

/// Point-in-time view of a replay, as reported by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySnapshot {
    pub id: Uuid,
    pub scenario: String,
    pub state: ReplayState,
    pub delivered: usize,
    pub failed: usize,
    pub total: usize,
    pub started_at: DateTime<Utc>,
    /// Whether the progress stream has been claimed.
    pub subscribed: bool,
}

/// Tracks running and recently finished replays. Every replay owns its own
/// progress channel, so concurrent replays never share frames.
#[derive(Clone)]
pub struct ReplayRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, Arc<ReplaySession>>>>,
    settings: ReplaySettings,
}

impl ReplayRegistry {
    pub fn new(settings: ReplaySettings) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            settings,
        }
    }

    /// Spawn a replay of the artifact at `path`. Must be called from within a
    /// tokio runtime.
    pub fn start(
        &self,
        scenario: impl Into<String>,
        path: PathBuf,
        sink: Arc<dyn IngestSink>,
    ) -> Result<Uuid, RegistryError> {
        let scenario = scenario.into();
        let mut sessions = self.sessions.lock();

        let active = count_active(&sessions);
        if active >= self.settings.max_concurrent {
            return Err(RegistryError::Busy {
                limit: self.settings.max_concurrent,
            });
        }
        prune_finished(&mut sessions);

        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));
        let monitor = ReplayMonitor::new();
        let cancel = CancellationToken::new();

        sessions.insert(
            id,
            Arc::new(ReplaySession {
                scenario: scenario.clone(),
                started_at: Utc::now(),
                monitor: monitor.clone(),
                cancel: cancel.clone(),
                progress: Mutex::new(Some(rx)),
            }),
        );
        drop(sessions);

        info!(%id, scenario = %scenario, path = %path.display(), "replay started");

        let engine = ReplayEngine::new(sink).with_monitor(monitor);
        tokio::spawn(async move {
            let summary = engine.run(&path, tx, cancel).await;
            info!(
                %id,
                status = ?summary.status,
                delivered = summary.delivered,
                failed = summary.failed,
                "replay finished"
            );
        });

        Ok(id)
    }

    /// Claim the progress stream of a replay. Only the first caller gets it.
    pub fn subscribe(&self, id: Uuid) -> Result<mpsc::Receiver<ReplayFrame>, RegistryError> {
        let session = self.get(id)?;
        let receiver = session.progress.lock().take();
        receiver.ok_or(RegistryError::AlreadySubscribed(id))
    }

    /// Request cancellation. The replay stops before its next delivery.
    pub fn cancel(&self, id: Uuid) -> Result<ReplaySnapshot, RegistryError> {
        let session = self.get(id)?;
        if !session.monitor.state().is_finished() {
            info!(%id, "replay cancellation requested");
        }
        session.cancel.cancel();
        Ok(snapshot_of(id, &session))
    }

    pub fn snapshot(&self, id: Uuid) -> Option<ReplaySnapshot> {
        let sessions = self.sessions.lock();
        sessions.get(&id).map(|session| snapshot_of(id, session))
    }

    pub fn active_count(&self) -> usize {
        count_active(&self.sessions.lock())
    }

    pub fn settings(&self) -> &ReplaySettings {
        &self.settings
    }

    /// Cancel every replay still running.
    pub fn shutdown(&self) {
        for session in self.sessions.lock().values() {
            session.cancel.cancel();
        }
    }

    fn get(&self, id: Uuid) -> Result<Arc<ReplaySession>, RegistryError> {
        self.sessions
            .lock()
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }
}

fn snapshot_of(id: Uuid, session: &ReplaySession) -> ReplaySnapshot {
    let counters = session.monitor.get();
    ReplaySnapshot {
        id,
        scenario: session.scenario.clone(),
        state: counters.state,
        delivered: counters.delivered,
        failed: counters.failed,
        total: counters.total,
        started_at: session.started_at,
        subscribed: session.progress.lock().is_none(),
    }
}

fn count_active(sessions: &HashMap<Uuid, Arc<ReplaySession>>) -> usize {
    sessions
        .values()
        .filter(|s| !s.monitor.state().is_finished())
        .count()
}

fn prune_finished(sessions: &mut HashMap<Uuid, Arc<ReplaySession>>) {
    let mut finished: Vec<(DateTime<Utc>, Uuid)> = sessions
        .iter()
        .filter(|(_, s)| s.monitor.state().is_finished())
        .map(|(id, s)| (s.started_at, *id))
        .collect();
    if finished.len() < RETAINED_FINISHED {
        return;
    }
    finished.sort();
    let excess = finished.len() + 1 - RETAINED_FINISHED;
    for (_, id) in finished.into_iter().take(excess) {
        sessions.remove(&id);
    }
}
