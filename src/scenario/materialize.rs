use serde_json::Value;
use tracing::warn;

use crate::shape::{millis_field, Shape};
use crate::TIMESTAMP_FIELD;

use super::Scenario;

/// Field of a search hit that carries the event itself.
pub const SOURCE_FIELD: &str = "_source";

/// Turn sanitized search hits into a scenario.
///
/// Each hit contributes its `_source` object. Hits without an object payload
/// or without a numeric `@timestamp` are skipped. The first kept record's
/// timestamp is the origin, and every kept record's timestamp is rewritten to
/// `origin - timestamp`. A hit whose offset does not fit in an `i64` is
/// skipped.
pub fn materialize(hits: Vec<Value>) -> Scenario {
    let mut events = Vec::with_capacity(hits.len());
    let mut origin: Option<i64> = None;
    let mut skipped = 0;

    for (index, mut hit) in hits.into_iter().enumerate() {
        if let Err(err) = Shape::new(&hit).object(SOURCE_FIELD) {
            warn!(index, error = %err, "skipping hit without a usable payload");
            skipped += 1;
            continue;
        }

        let Some(Value::Object(mut source)) = hit
            .as_object_mut()
            .and_then(|hit| hit.remove(SOURCE_FIELD))
        else {
            skipped += 1;
            continue;
        };

        let timestamp = match millis_field(&source, TIMESTAMP_FIELD) {
            Ok(ts) => ts,
            Err(err) => {
                warn!(index, error = %err, "skipping hit without a numeric timestamp");
                skipped += 1;
                continue;
            }
        };

        let offset = match origin {
            None => {
                origin = Some(timestamp);
                0
            }
            Some(origin) => match origin.checked_sub(timestamp) {
                Some(offset) => offset,
                None => {
                    warn!(index, timestamp, origin, "skipping hit whose offset overflows");
                    skipped += 1;
                    continue;
                }
            },
        };
        source.insert(TIMESTAMP_FIELD.to_string(), Value::from(offset));
        events.push(source);
    }

    Scenario {
        events,
        origin_ms: origin,
        skipped,
    }
}
