//! First-occurrence deduplication by origin transaction

use std::collections::HashSet;
use tracing::debug;

use crate::event::ExtractedEvent;

/// Keep the first event per `originTx`, in input order. Events without an
/// origin tx are dropped.
pub fn dedupe_by_origin_tx<I>(events: I) -> Vec<ExtractedEvent>
where
    I: IntoIterator<Item = ExtractedEvent>,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    let mut dropped = 0usize;

    for event in events {
        match event.origin_tx() {
            Some(tx) if seen.insert(tx.to_string()) => kept.push(event),
            _ => dropped += 1,
        }
    }

    debug!(kept = kept.len(), dropped, "Deduplicated events by origin tx");
    kept
}
