//! Path parsing and traversal over configuration records
//!
//! Record fields are addressed with `/`-separated key paths such as
//! `/identity/sku-id`. A leading `/` is optional; `identity/sku-id`
//! addresses the same value.
//!
//! # Examples
//!
//! ```
//! use hwconfig_schema::path::{get_at_path, parse_path};
//! use serde_json::json;
//!
//! let path = parse_path("/identity/sku-id");
//! assert_eq!(path, vec!["identity", "sku-id"]);
//!
//! let record = json!({"identity": {"sku-id": 4}});
//! assert_eq!(get_at_path(&record, &path), Some(&json!(4)));
//! ```

use serde_json::Value;

/// Split a path into its keys.
///
/// Empty segments (from leading, trailing or doubled `/`) are skipped.
pub fn parse_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Get a reference to the value at the given path.
///
/// Returns `None` if the path doesn't exist.
pub fn get_at_path<'a>(value: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(value, |current, key| current.get(key.as_str()))
}

/// Read a string at `path`, or `None` when absent or not a string.
pub fn get_str<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    get_at_path(value, &parse_path(path)).and_then(Value::as_str)
}

/// Set a value at the given path.
///
/// Intermediate maps must already exist. Returns `true` if the value was
/// set, `false` if a parent along the path is missing or not a map.
///
/// ```
/// use hwconfig_schema::path::{parse_path, set_at_path};
/// use serde_json::json;
///
/// let mut record = json!({"identity": {"whitelabel-tag": "blue"}});
/// assert!(set_at_path(&mut record, &parse_path("/identity/whitelabel-tag"), json!("")));
/// assert_eq!(record, json!({"identity": {"whitelabel-tag": ""}}));
/// ```
pub fn set_at_path(value: &mut Value, segments: &[String], new_value: Value) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        *value = new_value;
        return true;
    };

    match get_at_path_mut(value, parents) {
        Some(Value::Object(map)) => {
            map.insert(last.clone(), new_value);
            true
        }
        _ => false,
    }
}

/// Remove the value at the given path.
///
/// Returns the removed value if the path existed, `None` otherwise.
pub fn remove_at_path(value: &mut Value, segments: &[String]) -> Option<Value> {
    let (last, parents) = segments.split_last()?;
    match get_at_path_mut(value, parents)? {
        Value::Object(map) => map.remove(last),
        _ => None,
    }
}

fn get_at_path_mut<'a>(value: &'a mut Value, segments: &[String]) -> Option<&'a mut Value> {
    segments
        .iter()
        .try_fold(value, |current, key| current.get_mut(key.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path_simple() {
        assert_eq!(parse_path("name"), vec!["name"]);
    }

    #[test]
    fn test_parse_path_leading_slash_is_optional() {
        assert_eq!(parse_path("/identity/sku-id"), parse_path("identity/sku-id"));
        assert_eq!(parse_path("//audio/main/"), vec!["audio", "main"]);
    }

    #[test]
    fn test_get_at_path_missing() {
        let value = json!({"name": "reef"});
        assert_eq!(get_at_path(&value, &parse_path("/identity/sku-id")), None);
    }

    #[test]
    fn test_get_str_ignores_non_strings() {
        let value = json!({"identity": {"sku-id": 4, "platform-name": "Reef"}});
        assert_eq!(get_str(&value, "/identity/platform-name"), Some("Reef"));
        assert_eq!(get_str(&value, "/identity/sku-id"), None);
    }

    #[test]
    fn test_set_at_path_requires_parent() {
        let mut value = json!({"name": "reef"});
        assert!(!set_at_path(&mut value, &parse_path("/identity/sku-id"), json!(1)));
        assert_eq!(value, json!({"name": "reef"}));
    }

    #[test]
    fn test_remove_at_path_nested() {
        let mut value = json!({"audio": {"main": {"files": [], "card": "a"}}});
        let removed = remove_at_path(&mut value, &parse_path("/audio/main/files"));
        assert_eq!(removed, Some(json!([])));
        assert_eq!(value, json!({"audio": {"main": {"card": "a"}}}));
    }

    #[test]
    fn test_remove_at_path_through_scalar() {
        let mut value = json!({"audio": "none"});
        assert_eq!(remove_at_path(&mut value, &parse_path("/audio/main")), None);
        assert_eq!(value, json!({"audio": "none"}));
    }
}
