//! Fleet-wide invariants over the merged record set
//!
//! Checks run in a fixed order and the first violation is returned:
//! identity uniqueness, whitelabel branding-only differences, then typed
//! hardware properties. Validation never mutates the document.

use crate::document::{self, IDENTITY};
use crate::path::{parse_path, set_at_path};
use crate::{Error, Result};
use serde_json::Value;
use similar::TextDiff;
use std::collections::{BTreeMap, HashSet};

/// Record fields a whitelabel variant is allowed to change
pub const BRAND_ELEMENTS: &[&str] = &["brand-code", "firmware-signing", "wallpaper"];

pub const WHITELABEL_TAG: &str = "whitelabel-tag";
pub const HARDWARE_PROPERTIES: &str = "hardware-properties";

/// Runs every cross-record check.
#[derive(Debug, Clone, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate the records of an expanded, merged document.
    pub fn validate(&self, doc: &Value, root: &str) -> Result<()> {
        let records = document::configs(doc, root)?;
        check_unique_identities(records)?;
        check_whitelabel_brand_only(records)?;
        check_hardware_properties(records)?;
        tracing::debug!(records = records.len(), "Validation passed");
        Ok(())
    }
}

fn identity_key(record: &Value) -> String {
    document::sort_keys(&Value::Object(document::identity(record))).to_string()
}

/// Every record's identity, absent treated as empty, must be unique.
pub fn check_unique_identities(records: &[Value]) -> Result<()> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for record in records {
        let key = identity_key(record);
        if !seen.insert(key.clone()) && !duplicates.contains(&key) {
            duplicates.push(key);
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(Error::DuplicateIdentity { duplicates })
    }
}

/// Records sharing a name and SKU id that carry a whitelabel tag may only
/// differ in branding.
pub fn check_whitelabel_brand_only(records: &[Value]) -> Result<()> {
    let mut groups: BTreeMap<String, Vec<Value>> = BTreeMap::new();

    for record in records {
        let identity = document::identity(record);
        let tagged = identity
            .get(WHITELABEL_TAG)
            .and_then(Value::as_str)
            .is_some_and(|tag| !tag.is_empty());
        if !tagged {
            continue;
        }
        let sku_id = identity.get("sku-id").cloned().unwrap_or(Value::from(0));
        let group = format!("{} - {}", document::record_name(record), scalar_text(&sku_id));

        let blanked = blank_branding(record);
        let members = groups.entry(group).or_default();
        if !members.contains(&blanked) {
            members.push(blanked);
        }
    }

    for (group, members) in &groups {
        if let [first, second, ..] = members.as_slice() {
            let first = pretty(first);
            let second = pretty(second);
            let diff = TextDiff::from_lines(&first, &second)
                .unified_diff()
                .header("example 1", "example 2")
                .to_string();
            return Err(Error::WhitelabelScopeViolation {
                group: group.clone(),
                brand_elements: BRAND_ELEMENTS.join(", "),
                first,
                second,
                diff,
            });
        }
    }

    Ok(())
}

fn blank_branding(record: &Value) -> Value {
    let mut blanked = record.clone();
    for element in BRAND_ELEMENTS {
        set_at_path(&mut blanked, &parse_path(element), Value::from(""));
    }
    set_at_path(
        &mut blanked,
        &[IDENTITY.to_string(), WHITELABEL_TAG.to_string()],
        Value::from(""),
    );
    blanked
}

/// Every `hardware-properties` value must be a literal boolean.
pub fn check_hardware_properties(records: &[Value]) -> Result<()> {
    for record in records {
        let Some(properties) = record.get(HARDWARE_PROPERTIES).and_then(Value::as_object) else {
            continue;
        };
        if let Some((key, value)) = properties.iter().find(|(_, v)| !v.is_boolean()) {
            return Err(Error::InvalidHardwarePropertyType {
                key: key.clone(),
                value: scalar_text(value),
            });
        }
    }
    Ok(())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pretty(record: &Value) -> String {
    serde_json::to_string_pretty(&document::sort_keys(record)).unwrap_or_default()
}
