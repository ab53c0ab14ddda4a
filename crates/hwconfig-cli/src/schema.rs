//! JSON Schema gate for the compiler

use hwconfig_schema::{Error, Result, SchemaValidator};
use serde_json::Value;

/// Validates documents with the `jsonschema` crate.
///
/// Only the first violation is reported.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &Value, doc: &Value) -> Result<()> {
        let validator = jsonschema::validator_for(schema).map_err(|e| Error::SchemaValidationFailure {
            path: "(schema)".to_string(),
            message: e.to_string(),
        })?;

        if let Some(error) = validator.iter_errors(doc).next() {
            let path = error.instance_path.to_string();
            return Err(Error::SchemaValidationFailure {
                path: if path.is_empty() { "/".to_string() } else { path },
                message: error.to_string(),
            });
        }
        tracing::debug!("Schema validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reports_instance_path() {
        let schema = json!({
            "type": "object",
            "properties": {"chromeos": {"type": "object", "properties": {
                "configs": {"type": "array", "items": {
                    "type": "object",
                    "properties": {"name": {"type": "string"}}
                }}
            }}}
        });
        let doc = json!({"chromeos": {"configs": [{"name": "ok"}, {"name": 3}]}});
        let err = JsonSchemaValidator.validate(&schema, &doc).unwrap_err();
        match err {
            Error::SchemaValidationFailure { path, .. } => assert_eq!(path, "/chromeos/configs/1/name"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_document_passes() {
        let schema = json!({"type": "object"});
        JsonSchemaValidator.validate(&schema, &json!({"chromeos": {}})).unwrap();
    }
}
