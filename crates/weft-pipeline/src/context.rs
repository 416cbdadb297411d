//! The ordered key/value map threaded between pipeline steps.
//!
//! Later steps may reference earlier outputs, so iteration order must match
//! insertion order; `set` on an existing key replaces the value in place
//! without moving it to the end, matching the invariant in the design.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered key/value context shared between pipeline steps.
///
/// Values are opaque `serde_json::Value`s. This crate does not auto-wrap
/// scalars into a `{"value": ...}` envelope; callers that want that
/// convention (observed as a test-suite behavior of the source system, not
/// a hard requirement) should apply it themselves before calling `set`, and
/// consistently on `get` as well.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PluginContext {
    entries: IndexMap<String, Value>,
}

impl PluginContext {
    /// A fresh, empty context, distinct from any prior instance.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert or replace the value for `key`. Replacing an existing key
    /// preserves its original position in iteration order.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns the value and whether the key was present, mirroring the
    /// design's `get(k) -> (v, present?)` signature for callers that need
    /// to distinguish "absent" from "present with a JSON null".
    pub fn get_checked(&self, key: &str) -> (Option<&Value>, bool) {
        match self.entries.get(key) {
            Some(v) => (Some(v), true),
            None => (None, false),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge every key from `other` into `self`, overwriting colliding
    /// entries — the step-level merge rule used by the pipeline runtime.
    pub fn merge_overwrite(&mut self, other: &PluginContext) {
        for (key, value) in other.iter() {
            self.set(key.to_string(), value.clone());
        }
    }

    /// Convert to a `serde_json::Map`, e.g. for flattening into a reactive
    /// handler's `data` payload.
    pub fn to_json_map(&self) -> serde_json::Map<String, Value> {
        self.entries.clone().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_contexts_are_distinct_and_empty() {
        let a = PluginContext::new();
        let mut b = PluginContext::new();
        b.set("k", json!(1));
        assert!(a.is_empty());
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn set_preserves_insertion_order_on_replace() {
        let mut ctx = PluginContext::new();
        ctx.set("a", json!(1));
        ctx.set("b", json!(2));
        ctx.set("a", json!(99));
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(ctx.get("a"), Some(&json!(99)));
    }

    #[test]
    fn get_checked_distinguishes_absent_from_null() {
        let mut ctx = PluginContext::new();
        ctx.set("present_null", Value::Null);
        let (value, present) = ctx.get_checked("present_null");
        assert_eq!(value, Some(&Value::Null));
        assert!(present);

        let (value, present) = ctx.get_checked("missing");
        assert_eq!(value, None);
        assert!(!present);
    }

    #[test]
    fn merge_overwrite_replaces_colliding_keys_in_place() {
        let mut ctx = PluginContext::new();
        ctx.set("a", json!(1));
        ctx.set("b", json!(2));

        let mut other = PluginContext::new();
        other.set("b", json!(3));
        other.set("c", json!(4));

        ctx.merge_overwrite(&other);
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(ctx.get("b"), Some(&json!(3)));
    }
}
