use std::collections::HashMap;

use haulway_core::FeatureId;
use serde_json::{Map, Value};

/// Derive a stable id for the feature at `index` of a layer.
///
/// Numeric ids are namespaced with `prefix`; string ids are kept verbatim.
/// A missing or empty feature id falls back to `properties.id` (trimmed when
/// it is a string), then to the feature's position in the layer.
pub(super) fn normalise_id(
    raw: Option<&Value>,
    properties: &Map<String, Value>,
    prefix: &str,
    index: usize,
) -> FeatureId {
    match raw {
        None | Some(Value::Null) => fallback_id(properties, prefix, index),
        Some(Value::String(id)) if id.is_empty() => fallback_id(properties, prefix, index),
        Some(Value::String(id)) => FeatureId::new(id.as_str()),
        Some(Value::Number(id)) => FeatureId::prefixed(prefix, id),
        Some(other) => FeatureId::new(other.to_string()),
    }
}

fn fallback_id(properties: &Map<String, Value>, prefix: &str, index: usize) -> FeatureId {
    match properties.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => FeatureId::new(id.trim()),
        Some(Value::Number(id)) if id.as_f64().is_some_and(f64::is_finite) => {
            FeatureId::prefixed(prefix, id)
        }
        _ => FeatureId::prefixed(prefix, index),
    }
}

/// Flatten feature properties into display tags.
///
/// Scalars are rendered as text, nested values as compact JSON and nulls
/// are dropped.
pub(super) fn flatten_tags(properties: Map<String, Value>) -> HashMap<String, String> {
    properties
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(text) => text,
                other => other.to_string(),
            };
            Some((key, text))
        })
        .collect()
}
