use serde_json::Value;

use crate::config::FieldConfig;
use crate::payload::SubmittedItem;
use crate::repo::AttrMap;

/// Attribute names the field is permitted to persist.
///
/// The explicit save-only set wins verbatim; otherwise the set derives from
/// the declared sub-fields minus the primary key.
pub fn allowed_keys(config: &FieldConfig) -> Vec<String> {
    if !config.save_only_fields.is_empty() {
        return config.save_only_fields.clone();
    }

    config
        .fields
        .iter()
        .filter(|name| **name != config.primary_key)
        .cloned()
        .collect()
}

/// Recursive blank check.
///
/// Null, blank strings, and containers whose every leaf is blank count as
/// blank. Numbers and booleans never do, `0` and `false` included.
pub fn is_deep_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(_) | Value::Bool(_) => false,
        Value::Array(items) => items.iter().all(is_deep_blank),
        Value::Object(map) => map.values().all(is_deep_blank),
    }
}

/// Attribute subset of a submitted item that should be persisted.
///
/// Intersects the item's plain values with the allowed key set and drops
/// deep-blank values. Uploads never pass through here; the reconciler writes
/// the stored path into the image attribute after filtering.
pub fn prepare_attrs(item: &SubmittedItem, config: &FieldConfig) -> AttrMap {
    let keys = allowed_keys(config);
    let mut attrs = AttrMap::new();

    for key in keys {
        if let Some(value) = item.json(&key)
            && !is_deep_blank(value)
        {
            attrs.insert(key, value.clone());
        }
    }

    attrs
}
