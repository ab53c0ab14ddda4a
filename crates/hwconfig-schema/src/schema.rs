//! Structural schema boundary
//!
//! The pipeline treats structural validation as an opaque gate behind
//! [`SchemaValidator`]; the binary plugs in a JSON Schema implementation.

use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Path from a schema's root to the per-record property schemas
pub const CONFIG_PROPERTIES_PATH: &[&str] =
    &["properties", "chromeos", "properties", "configs", "items", "properties"];

/// Validates a document against a schema document.
pub trait SchemaValidator {
    /// Return `Error::SchemaValidationFailure` naming the offending path.
    fn validate(&self, schema: &Value, doc: &Value) -> Result<()>;
}

/// Accepts every document
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl SchemaValidator for AcceptAll {
    fn validate(&self, _schema: &Value, _doc: &Value) -> Result<()> {
        Ok(())
    }
}

impl<F> SchemaValidator for F
where
    F: Fn(&Value, &Value) -> Result<()>,
{
    fn validate(&self, schema: &Value, doc: &Value) -> Result<()> {
        self(schema, doc)
    }
}

/// Catalogue the string-typed properties a record may carry.
///
/// Keys are node paths within a record (`/` for the record itself), values
/// the string property names declared at that node, in schema order.
///
/// ```
/// use hwconfig_schema::schema::valid_schema_properties;
/// use serde_json::json;
///
/// let schema = json!({"properties": {"chromeos": {"properties": {"configs": {"items": {
///     "properties": {
///         "name": {"type": "string"},
///         "audio": {"type": "object", "properties": {"card": {"type": "string"}}}
///     }
/// }}}}}});
/// let props = valid_schema_properties(&schema).unwrap();
/// assert_eq!(props["/"], vec!["name"]);
/// assert_eq!(props["/audio"], vec!["card"]);
/// ```
pub fn valid_schema_properties(schema: &Value) -> Result<BTreeMap<String, Vec<String>>> {
    let mut node = schema;
    for element in CONFIG_PROPERTIES_PATH {
        node = node
            .get(element)
            .ok_or_else(|| Error::missing(CONFIG_PROPERTIES_PATH.join("/"), "schema"))?;
    }

    let mut result = BTreeMap::new();
    collect_properties(node, &mut Vec::new(), &mut result);
    Ok(result)
}

fn collect_properties(node: &Value, path: &mut Vec<String>, result: &mut BTreeMap<String, Vec<String>>) {
    let Some(properties) = node.as_object() else {
        return;
    };
    let full_path = format!("/{}", path.join("/"));

    for (key, property) in properties {
        match property.get("type").and_then(Value::as_str) {
            Some("object") => {
                if let Some(children) = property.get("properties") {
                    path.push(key.clone());
                    collect_properties(children, path, result);
                    path.pop();
                }
            }
            Some("string") => {
                result.entry(full_path.clone()).or_default().push(key.clone());
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_root_path() {
        let err = valid_schema_properties(&json!({"properties": {}})).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField { .. }));
    }

    #[test]
    fn test_non_string_leaves_are_skipped() {
        let schema = json!({"properties": {"chromeos": {"properties": {"configs": {"items": {
            "properties": {
                "sku": {"type": "integer"},
                "flags": {"type": "object"},
                "name": {"type": "string"}
            }
        }}}}}});
        let props = valid_schema_properties(&schema).unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props["/"], vec!["name"]);
    }

    #[test]
    fn test_closure_validators() {
        let reject = |_: &Value, _: &Value| -> Result<()> {
            Err(Error::SchemaValidationFailure {
                path: "/chromeos".into(),
                message: "nope".into(),
            })
        };
        assert!(reject.validate(&json!({}), &json!({})).is_err());
        assert!(AcceptAll.validate(&json!({}), &json!({})).is_ok());
    }
}
