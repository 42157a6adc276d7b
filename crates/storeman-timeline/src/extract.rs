//! Field extraction from raw log messages

use regex::Regex;
use std::sync::OnceLock;
use storeman_logsearch_sdk::RawLogRecord;
use tracing::debug;

use crate::event::{EventKind, ExtractedEvent};

/// Compiled patterns per event kind, parallel to `EventKind::fields()`.
fn patterns(kind: EventKind) -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Vec<Regex>>> = OnceLock::new();
    let compiled = COMPILED.get_or_init(|| {
        EventKind::ALL
            .iter()
            .map(|kind| {
                kind.fields()
                    .iter()
                    .map(|spec| Regex::new(spec.pattern).expect("valid field pattern"))
                    .collect()
            })
            .collect()
    });
    &compiled[kind.index()]
}

/// Apply the kind's field table to one message. Fields whose pattern does not
/// match are absent; extraction itself never fails.
pub fn extract(timestamp: &str, message: &str, kind: EventKind) -> ExtractedEvent {
    let values = patterns(kind)
        .iter()
        .map(|re| {
            re.captures(message)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
        .collect();
    ExtractedEvent::from_values(kind, timestamp, message, values)
}

/// Extract every record, keeping input order.
pub fn extract_all(records: &[RawLogRecord], kind: EventKind) -> Vec<ExtractedEvent> {
    let events: Vec<ExtractedEvent> = records
        .iter()
        .map(|record| extract(&record.timestamp, &record.message, kind))
        .collect();
    debug!(kind = ?kind, events = events.len(), "Extracted events");
    events
}
