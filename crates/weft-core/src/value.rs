//! Shared value representation used by contexts, events, and persisted blobs.

use serde_json::{Map, Value};

/// The arbitrary-key/value representation used for plugin configs, context
/// entries, and event payloads throughout the engine.
pub type JsonMap = Map<String, Value>;

/// Merge `source` into `target`, overwriting any colliding keys — the
/// "step-level keys overwrite existing entries" merge rule from the
/// pipeline runtime, reused verbatim by the reactive handlers when they
/// seed a triggered pipeline's context.
pub fn merge_overwrite(target: &mut JsonMap, source: &JsonMap) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

/// Merge `source` into `target` without overwriting keys already present in
/// `target` — used when layering caller-supplied overrides on top of
/// event-derived defaults, where the caller's *own* context should win but
/// the event's remaining fields should still flow in.
pub fn merge_without_overwrite(target: &mut JsonMap, source: &JsonMap) {
    for (key, value) in source {
        target.entry(key.clone()).or_insert_with(|| value.clone());
    }
}
