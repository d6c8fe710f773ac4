//! Timed replay of stored scenarios into an ingestion endpoint.

mod engine;
mod progress;
mod session;
mod sink;

pub use engine::{emit_time, ReplayEngine};
pub use progress::{
    ReplayCounters, ReplayFrame, ReplayMonitor, ReplayOutcome, ReplayProgress, ReplayState,
    ReplaySummary,
};
pub use session::{RegistryError, ReplayRegistry, ReplaySnapshot};
pub use sink::{HttpIngestSink, IngestSink, SinkError};
