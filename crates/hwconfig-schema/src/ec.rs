//! EC feature table
//!
//! Per EC build target and SKU id, the boolean hardware-property flags the
//! embedded controller firmware is built with.

use crate::document::{self, IDENTITY};
use crate::validate::HARDWARE_PROPERTIES;
use crate::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Flags of every SKU, grouped by upper-cased EC build target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EcFeatureTable {
    /// Every flag name seen, sorted, with `-` replaced by `_`.
    pub flags: Vec<String>,
    /// Build target -> SKU id -> flag -> value. Every SKU lists every flag.
    pub targets: BTreeMap<String, BTreeMap<i64, BTreeMap<String, bool>>>,
}

/// Derive the EC feature table from an expanded document.
///
/// Records without an EC build target or SKU id are skipped. Duplicate SKUs
/// within a target keep the last record.
pub fn ec_feature_table(doc: &Value, root: &str) -> Result<EcFeatureTable> {
    let mut flag_set = BTreeSet::new();
    let mut targets: BTreeMap<String, BTreeMap<i64, BTreeMap<String, bool>>> = BTreeMap::new();

    for record in document::configs(doc, root)? {
        let name = document::record_name(record);
        let firmware = record.get("firmware");
        let Some(build_targets) = firmware.and_then(|f| f.get("build-targets")) else {
            let no_firmware = firmware
                .and_then(|f| f.get("no-firmware"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if !no_firmware {
                tracing::warn!(config = name, "Config missing 'firmware.build-targets', skipping");
            }
            continue;
        };
        let Some(ec) = build_targets.get("ec").and_then(Value::as_str) else {
            tracing::warn!(config = name, "Config missing 'firmware.build-targets.ec', skipping");
            continue;
        };
        let Some(identity) = record.get(IDENTITY) else {
            tracing::warn!(config = name, "Config missing 'identity', skipping");
            continue;
        };
        let Some(sku_id) = identity.get("sku-id").and_then(Value::as_i64) else {
            tracing::warn!(config = name, "Config missing 'identity.sku-id', skipping");
            continue;
        };

        let mut flags = BTreeMap::new();
        if let Some(properties) = record.get(HARDWARE_PROPERTIES).and_then(Value::as_object) {
            for (flag, value) in properties {
                let clean = flag.replace('-', "_");
                flag_set.insert(clean.clone());
                flags.insert(clean, value.as_bool().unwrap_or(false));
            }
        }
        targets
            .entry(ec.to_uppercase())
            .or_default()
            .insert(sku_id, flags);
    }

    for skus in targets.values_mut() {
        for flags in skus.values_mut() {
            for flag in &flag_set {
                flags.entry(flag.clone()).or_insert(false);
            }
        }
    }

    Ok(EcFeatureTable {
        flags: flag_set.into_iter().collect(),
        targets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(name: &str, ec: &str, sku: i64, props: Value) -> Value {
        json!({
            "name": name,
            "identity": {"sku-id": sku},
            "firmware": {"build-targets": {"ec": ec}},
            "hardware-properties": props
        })
    }

    #[test]
    fn test_flags_are_normalized_and_filled() {
        let doc = json!({"chromeos": {"configs": [
            record("a", "reef", 1, json!({"is-lid-convertible": true})),
            record("b", "reef", 2, json!({"has-base-accelerometer": true})),
            record("c", "coral", 7, json!({})),
        ]}});

        let table = ec_feature_table(&doc, "chromeos").unwrap();
        assert_eq!(table.flags, vec!["has_base_accelerometer", "is_lid_convertible"]);
        assert_eq!(
            table.targets["REEF"][&1],
            BTreeMap::from([
                ("has_base_accelerometer".to_string(), false),
                ("is_lid_convertible".to_string(), true),
            ])
        );
        assert_eq!(table.targets["CORAL"][&7].len(), 2);
    }

    #[test]
    fn test_last_duplicate_sku_wins() {
        let doc = json!({"chromeos": {"configs": [
            record("a", "reef", 1, json!({"x": false})),
            record("b", "reef", 1, json!({"x": true})),
        ]}});
        let table = ec_feature_table(&doc, "chromeos").unwrap();
        assert!(table.targets["REEF"][&1]["x"]);
    }

    #[test]
    fn test_unusable_configs_are_skipped() {
        let doc = json!({"chromeos": {"configs": [
            {"name": "nofw", "firmware": {"no-firmware": true}},
            {"name": "noec", "firmware": {"build-targets": {"coreboot": "reef"}}},
            {"name": "noid", "firmware": {"build-targets": {"ec": "reef"}}},
            {"name": "nosku", "identity": {}, "firmware": {"build-targets": {"ec": "reef"}}}
        ]}});
        let table = ec_feature_table(&doc, "chromeos").unwrap();
        assert_eq!(table, EcFeatureTable::default());
    }
}
