//! Fixture documents, embedded at compile time.
//!
//! The authored fleet compiles to five records:
//!
//! | name    | sku-id | whitelabel-tag | source       |
//! |---------|--------|----------------|--------------|
//! | basking | 4      |                | fleet.yaml   |
//! | basking | 5      |                | fleet.yaml   |
//! | electro | 8      | blue           | fleet.yaml   |
//! | electro | 8      | red            | fleet.yaml   |
//! | nami    | 20     |                | overlay.yaml |

/// Anchors imported by [`FLEET_YAML`]
pub const COMMON_FIRMWARE_YAML: &str = include_str!("../fixtures/common/firmware.yaml");

/// Authored devices: `basking` with two SKUs and `electro` with two
/// whitelabel products.
pub const FLEET_YAML: &str = include_str!("../fixtures/fleet.yaml");

/// Flat overlay that adds a DSP file to `basking` SKU 4 and appends `nami`.
pub const OVERLAY_YAML: &str = include_str!("../fixtures/overlay.yaml");

/// JSON Schema accepting the compiled fleet
pub const SCHEMA_JSON: &str = include_str!("../fixtures/schema.json");

/// Node document with family-level shared nodes and two models, `reef`
/// and `pyro`, where `pyro` defaults to `reef`.
pub const RAW_TREE_JSON: &str = include_str!("../fixtures/raw_tree.json");

/// Relative path and contents of every authored source.
pub const FLEET_SOURCES: &[(&str, &str)] = &[
    ("common/firmware.yaml", COMMON_FIRMWARE_YAML),
    ("fleet.yaml", FLEET_YAML),
    ("overlay.yaml", OVERLAY_YAML),
];
