//! Document shape shared by every pipeline stage
//!
//! A document is a `serde_json::Value` of the form
//! `{ "<root>": { "configs": [ <record>, ... ] } }` once expanded, or
//! `{ "<root>": { "devices": [ ... ] } }` as authored.

use crate::{Error, Result};
use serde_json::{Map, Value};

/// Default root key of every document.
pub const ROOT_KEY: &str = "chromeos";
pub const CONFIGS: &str = "configs";
pub const DEVICES: &str = "devices";
pub const PRODUCTS: &str = "products";
pub const SKUS: &str = "skus";
pub const CONFIG: &str = "config";
pub const IDENTITY: &str = "identity";
pub const NAME: &str = "name";
pub const IMPORTS: &str = "imports";

/// Borrow the record list of an expanded document.
pub fn configs<'a>(doc: &'a Value, root: &str) -> Result<&'a Vec<Value>> {
    doc.get(root)
        .and_then(|r| r.get(CONFIGS))
        .and_then(Value::as_array)
        .ok_or_else(|| Error::missing(format!("{root}/{CONFIGS}"), "document"))
}

/// Mutably borrow the record list of an expanded document.
pub fn configs_mut<'a>(doc: &'a mut Value, root: &str) -> Result<&'a mut Vec<Value>> {
    doc.get_mut(root)
        .and_then(|r| r.get_mut(CONFIGS))
        .and_then(Value::as_array_mut)
        .ok_or_else(|| Error::missing(format!("{root}/{CONFIGS}"), "document"))
}

/// Wrap a record list into a document.
pub fn wrap_configs(root: &str, records: Vec<Value>) -> Value {
    let mut inner = Map::new();
    inner.insert(CONFIGS.to_string(), Value::Array(records));
    let mut outer = Map::new();
    outer.insert(root.to_string(), Value::Object(inner));
    Value::Object(outer)
}

/// The identity map of a record, or an empty map when it has none.
pub fn identity(record: &Value) -> Map<String, Value> {
    record
        .get(IDENTITY)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Name of a record, or `""`.
pub fn record_name(record: &Value) -> &str {
    record.get(NAME).and_then(Value::as_str).unwrap_or_default()
}

/// Recursively rebuild every map with its keys in sorted order.
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Render a document as key-sorted JSON with two-space indentation.
///
/// ```
/// use hwconfig_schema::document::to_pretty_json;
/// use serde_json::json;
///
/// let text = to_pretty_json(&json!({"b": 1, "a": [true]})).unwrap();
/// assert_eq!(text, "{\n  \"a\": [\n    true\n  ],\n  \"b\": 1\n}");
/// ```
pub fn to_pretty_json(doc: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(&sort_keys(doc))?)
}
