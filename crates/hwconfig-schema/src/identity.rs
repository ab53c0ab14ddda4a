//! Identity lookup table
//!
//! One entry per record, used to generate the runtime identity bindings
//! that map firmware-reported identity to a model.

use crate::document::{self, IDENTITY};
use crate::path::get_str;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;

/// Platforms migrated from the device-tree implementation. Their
/// customization string keeps the historical format.
pub const LEGACY_CUSTOMIZATION_PLATFORMS: &[&str] = &["Coral", "Fizz"];

/// How firmware identifies the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum IdentityMatch {
    SmbiosName(String),
    DeviceTreeCompatible(String),
}

/// Branding and signing info reported for a matched identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityInfo {
    pub brand: String,
    pub model: String,
    pub customization: String,
    pub signature_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityEntry {
    pub platform_name: String,
    #[serde(rename = "match")]
    pub matcher: IdentityMatch,
    pub sku_id: i64,
    pub customization_id: String,
    pub whitelabel_tag: String,
    pub info: IdentityInfo,
}

/// Whether `platform_name` uses the legacy customization format.
pub fn is_legacy_platform(platform_name: &str) -> bool {
    LEGACY_CUSTOMIZATION_PLATFORMS.contains(&platform_name)
}

/// Derive the identity table from an expanded document, in record order.
pub fn identity_table(doc: &Value, root: &str) -> Result<Vec<IdentityEntry>> {
    document::configs(doc, root)?
        .iter()
        .map(identity_entry)
        .collect()
}

/// Derive the identity entry of one record.
///
/// ```
/// use hwconfig_schema::identity::{identity_entry, IdentityMatch};
/// use serde_json::json;
///
/// let entry = identity_entry(&json!({
///     "name": "reef",
///     "identity": {"platform-name": "Reef", "smbios-name-match": "Reef", "sku-id": 4}
/// })).unwrap();
/// assert_eq!(entry.matcher, IdentityMatch::SmbiosName("Reef".into()));
/// assert_eq!(entry.info.customization, "reef");
/// assert_eq!(entry.info.signature_id, "reef");
/// ```
pub fn identity_entry(record: &Value) -> Result<IdentityEntry> {
    let name = document::record_name(record);
    let identity = record
        .get(IDENTITY)
        .and_then(Value::as_object)
        .ok_or_else(|| Error::missing(IDENTITY, format!("config '{name}'")))?;
    let text = |key: &str| -> String {
        identity
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let platform_name = text("platform-name");
    let whitelabel_tag = text("whitelabel-tag");
    let customization_id = text("customization-id");

    let mut customization = [&customization_id, &whitelabel_tag]
        .into_iter()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| name.to_string());
    if is_legacy_platform(&platform_name) {
        if !whitelabel_tag.is_empty() {
            customization = format!("{name}-{customization}");
        }
        customization = customization.to_uppercase();
    }

    let signature_id = get_str(record, "/firmware-signing/signature-id")
        .filter(|s| !s.is_empty())
        .unwrap_or(name)
        .to_string();

    let device_tree = text("device-tree-compatible-match");
    let matcher = if device_tree.is_empty() {
        IdentityMatch::SmbiosName(text("smbios-name-match"))
    } else {
        IdentityMatch::DeviceTreeCompatible(device_tree)
    };

    Ok(IdentityEntry {
        platform_name,
        matcher,
        sku_id: identity.get("sku-id").and_then(Value::as_i64).unwrap_or(-1),
        customization_id,
        whitelabel_tag,
        info: IdentityInfo {
            brand: record
                .get("brand-code")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            model: name.to_string(),
            customization,
            signature_id,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("Reef", json!({}), "reef")]
    #[case("Reef", json!({"whitelabel-tag": "blue"}), "blue")]
    #[case("Reef", json!({"customization-id": "acme", "whitelabel-tag": "blue"}), "acme")]
    #[case("Coral", json!({}), "REEF")]
    #[case("Coral", json!({"whitelabel-tag": "blue"}), "REEF-BLUE")]
    #[case("Fizz", json!({"customization-id": "acme"}), "ACME")]
    fn test_customization(#[case] platform: &str, #[case] extra: Value, #[case] expected: &str) {
        let mut identity = json!({"platform-name": platform});
        for (k, v) in extra.as_object().unwrap() {
            identity[k] = v.clone();
        }
        let entry = identity_entry(&json!({"name": "reef", "identity": identity})).unwrap();
        assert_eq!(entry.info.customization, expected);
    }

    #[test]
    fn test_device_tree_match_and_defaults() {
        let entry = identity_entry(&json!({
            "name": "kevin",
            "brand-code": "ABCD",
            "firmware-signing": {"signature-id": "KEVIN_SIG"},
            "identity": {"platform-name": "Gru", "device-tree-compatible-match": "google,kevin"}
        }))
        .unwrap();
        assert_eq!(entry.matcher, IdentityMatch::DeviceTreeCompatible("google,kevin".into()));
        assert_eq!(entry.sku_id, -1);
        assert_eq!(entry.info.brand, "ABCD");
        assert_eq!(entry.info.signature_id, "KEVIN_SIG");
    }

    #[test]
    fn test_missing_identity_is_required_field() {
        let err = identity_entry(&json!({"name": "reef"})).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField { .. }));
    }

    #[test]
    fn test_entry_serializes() {
        let entry = identity_entry(&json!({
            "name": "reef",
            "identity": {"platform-name": "Reef", "smbios-name-match": "Reef", "sku-id": 4}
        }))
        .unwrap();
        insta::assert_json_snapshot!(entry, @r#"
        {
          "platform_name": "Reef",
          "match": {
            "kind": "smbios-name",
            "value": "Reef"
          },
          "sku_id": 4,
          "customization_id": "",
          "whitelabel_tag": "",
          "info": {
            "brand": "",
            "model": "reef",
            "customization": "reef",
            "signature_id": "reef"
          }
        }
        "#);
    }
}
