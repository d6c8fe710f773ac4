//! Scenarios: ordered, sanitized event batches ready for replay.

mod error;
mod materialize;
mod store;

use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};

pub use error::ScenarioError;
pub use materialize::{materialize, SOURCE_FIELD};
pub use store::{ScenarioInfo, ScenarioStore};

/// One captured record: field name to value, in capture order.
pub type Event = Map<String, Value>;

/// An ordered batch of events whose `@timestamp` fields hold offsets from the
/// first captured event rather than absolute times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scenario {
    events: Vec<Event>,
    origin_ms: Option<i64>,
    skipped: usize,
}

impl Scenario {
    pub fn from_events(events: Vec<Event>) -> Self {
        Self {
            events,
            origin_ms: None,
            skipped: 0,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Capture time of the first event, when this scenario was built from hits
    /// in this process. Artifacts read back from disk do not carry it.
    pub fn origin_ms(&self) -> Option<i64> {
        self.origin_ms
    }

    /// Hits dropped during materialization.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Parse an artifact: a JSON array of objects.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ScenarioError> {
        let events: Vec<Event> = serde_json::from_slice(bytes)?;
        Ok(Self::from_events(events))
    }

    pub fn read_from_path(path: &Path) -> Result<Self, ScenarioError> {
        let bytes = std::fs::read(path).map_err(|e| ScenarioError::io(path, e))?;
        Self::from_slice(&bytes)
    }

    /// The artifact encoding: a two-space indented JSON array with a trailing
    /// newline.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, ScenarioError> {
        let mut out = serde_json::to_vec_pretty(&self.events)?;
        out.push(b'\n');
        Ok(out)
    }

    pub fn write_to(&self, mut writer: impl Write) -> Result<(), ScenarioError> {
        let bytes = self.to_pretty_json()?;
        writer
            .write_all(&bytes)
            .map_err(|e| ScenarioError::io("<writer>", e))
    }
}

impl From<Scenario> for Value {
    fn from(scenario: Scenario) -> Self {
        Value::Array(scenario.events.into_iter().map(Value::Object).collect())
    }
}
