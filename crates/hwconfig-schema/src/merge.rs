//! Cross-file merging of expanded documents
//!
//! The first document is the base. Each record of every later document is
//! an overlay: it is deep-merged into every base record it matches, or
//! appended when it matches none.

use crate::document::{self, ROOT_KEY};
use crate::{Error, Result};
use serde_json::Value;

/// Combines expanded documents by identity or name.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    root: String,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(ROOT_KEY)
    }
}

impl MergeEngine {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// Merge `docs` in order into one document.
    pub fn merge_documents(&self, docs: Vec<Value>) -> Result<Value> {
        let mut docs = docs.into_iter();
        let mut result = docs
            .next()
            .ok_or_else(|| Error::invalid("no documents to merge"))?;

        for overlay in docs {
            let records = document::configs(&overlay, &self.root)?.clone();
            let base = document::configs_mut(&mut result, &self.root)?;
            merge_records(base, records);
        }

        Ok(result)
    }
}

/// Apply `overlays` to `base`, strictly in order.
pub fn merge_records(base: &mut Vec<Value>, overlays: Vec<Value>) {
    for overlay in overlays {
        let mut matched = 0usize;
        for record in base.iter_mut() {
            if overlay_matches(record, &overlay) {
                deep_merge(record, &overlay);
                matched += 1;
            }
        }

        if matched == 0 {
            tracing::debug!(name = document::record_name(&overlay), "Overlay appended");
            base.push(overlay);
        } else {
            tracing::debug!(name = document::record_name(&overlay), matched, "Overlay merged");
        }
    }
}

/// Whether `overlay` applies to `base`.
///
/// An overlay with identity fields matches when every one of them is present
/// and equal in the base identity. An overlay without identity matches by
/// non-empty name.
///
/// ```
/// use hwconfig_schema::merge::overlay_matches;
/// use serde_json::json;
///
/// let base = json!({"name": "reef", "identity": {"sku-id": 4, "platform-name": "Reef"}});
/// assert!(overlay_matches(&base, &json!({"identity": {"sku-id": 4}})));
/// assert!(!overlay_matches(&base, &json!({"identity": {"sku-id": 5}})));
/// assert!(overlay_matches(&base, &json!({"name": "reef"})));
/// ```
pub fn overlay_matches(base: &Value, overlay: &Value) -> bool {
    let overlay_identity = document::identity(overlay);
    if !overlay_identity.is_empty() {
        let base_identity = document::identity(base);
        return overlay_identity
            .iter()
            .all(|(key, value)| base_identity.get(key) == Some(value));
    }

    let name = document::record_name(overlay);
    !name.is_empty() && name == document::record_name(base)
}

/// Merge `overlay` into `base`.
///
/// Missing keys are added, maps merge recursively, lists concatenate
/// (base first, no deduplication) and anything else is replaced.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                if let Some(base_val) = base_map.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_map.insert(key.clone(), overlay_val.clone());
                }
            }
        }
        (Value::Array(base_items), Value::Array(overlay_items)) => {
            base_items.extend(overlay_items.iter().cloned());
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}
