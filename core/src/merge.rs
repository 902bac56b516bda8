//! Recursive merge of layered JSON mappings.
//!
//! # Design
//! Overlays are applied in order, later ones winning. Object values merge
//! key by key; every other pairing (arrays, scalars, mismatched kinds)
//! replaces the base value wholesale. Falsy overlay values (`null`, `false`,
//! `0`, `""`) are treated as "not provided" and skipped at every depth, so a
//! per-call layer can never blank out a default by accident. Empty arrays
//! and empty objects are not falsy.

use serde_json::{Map, Value};

/// Merge `overlays` onto `base` in order and return the result.
pub fn merge<'a, I>(mut base: Map<String, Value>, overlays: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    for overlay in overlays {
        deep_merge(&mut base, overlay);
    }
    base
}

/// Merge a single overlay into `target` in place. The overlay is only read.
pub fn deep_merge(target: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        if !is_truthy(value) {
            continue;
        }
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            (Some(existing), _) => {
                *existing = value.clone();
            }
            (None, _) => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Truthiness as used by the merge: `null`, `false`, zero and the empty
/// string are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
