pub mod config;
pub mod replay;
pub mod sanitize;
pub mod scenario;
pub mod search;
pub mod shape;
pub mod util;
pub mod web;

/// Event field holding the epoch-millisecond time. Scenario artifacts reuse it
/// for the offset from the first captured event.
pub const TIMESTAMP_FIELD: &str = "@timestamp";

pub use config::Config;
pub use replay::{
    HttpIngestSink, IngestSink, ReplayEngine, ReplayFrame, ReplayProgress, ReplayRegistry,
    ReplayState, ReplaySummary,
};
pub use sanitize::{sanitize, SanitizationRules, Sanitizer};
pub use scenario::{materialize, Event, Scenario, ScenarioStore};
pub use search::{SearchClient, SearchError, SearchQuery, SearchTarget};
pub use web::{build_router, run_server, WebAppState};
