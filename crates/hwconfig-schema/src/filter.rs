//! Removal of build-only elements
//!
//! Some subtrees only matter while building images (firmware payloads,
//! signing, installed file lists) and are stripped from the runtime copy of
//! the configuration once validation has passed.

use crate::Result;
use crate::document;
use crate::path::{parse_path, remove_at_path};
use serde_json::Value;

/// Record paths removed by [`filter_build_elements`]
pub const BUILD_ONLY_ELEMENTS: &[&str] = &[
    "/firmware",
    "/firmware-signing",
    "/audio/main/files",
    "/touch/files",
    "/arc/files",
    "/thermal/files",
];

/// Strip build-only elements from every record of `doc`.
pub fn filter_build_elements(doc: &mut Value, root: &str) -> Result<()> {
    let paths: Vec<Vec<String>> = BUILD_ONLY_ELEMENTS.iter().map(|p| parse_path(p)).collect();
    for record in document::configs_mut(doc, root)? {
        for path in &paths {
            remove_at_path(record, path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_build_only_paths_are_removed() {
        let mut doc = json!({"chromeos": {"configs": [{
            "name": "reef",
            "firmware": {"image-name": "reef"},
            "firmware-signing": {"key-id": "REEF"},
            "audio": {"main": {"card": "a", "files": [{"source": "x"}]}},
            "touch": {"present": "yes", "files": []},
            "thermal": {"files": []}
        }]}});

        filter_build_elements(&mut doc, "chromeos").unwrap();
        assert_eq!(
            doc,
            json!({"chromeos": {"configs": [{
                "name": "reef",
                "audio": {"main": {"card": "a"}},
                "touch": {"present": "yes"},
                "thermal": {}
            }]}})
        );
    }

    #[test]
    fn test_only_exact_paths_match() {
        let mut doc = json!({"chromeos": {"configs": [{"other": {"firmware": 1, "files": 2}}]}});
        let before = doc.clone();
        filter_build_elements(&mut doc, "chromeos").unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_scalar_parents_are_left_alone() {
        let mut doc = json!({"chromeos": {"configs": [{"name": "reef", "audio": "none", "touch": []}]}});
        let before = doc.clone();
        filter_build_elements(&mut doc, "chromeos").unwrap();
        assert_eq!(doc, before);
    }
}
