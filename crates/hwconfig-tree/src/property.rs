//! Node properties

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Value of a single property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Str(String),
    StrList(Vec<String>),
    /// A flag whose meaning is its presence
    Presence,
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            Self::StrList(items) => Some(items),
            _ => None,
        }
    }
}

/// Renders the value as used in filename templates and CLI output.
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::StrList(items) => f.write_str(&items.join(" ")),
            Self::Presence => f.write_str("true"),
        }
    }
}

/// A node's ordered set of named values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
    values: IndexMap<String, PropertyValue>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// String value of `name`, or `""` when absent or not a string.
    pub fn get_str(&self, name: &str) -> &str {
        self.get(name).and_then(PropertyValue::as_str).unwrap_or_default()
    }

    /// String-list value of `name`, or empty.
    pub fn get_str_list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .and_then(PropertyValue::as_str_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    /// Presence test; the stored value is irrelevant.
    pub fn get_bool(&self, name: &str) -> bool {
        self.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let mut store = PropertyStore::new();
        store.insert("card", PropertyValue::Str("bxt".into()));
        store.insert("tools", PropertyValue::StrList(vec!["a".into(), "b".into()]));
        store.insert("no-firmware", PropertyValue::Presence);

        assert_eq!(store.get_str("card"), "bxt");
        assert_eq!(store.get_str("tools"), "");
        assert_eq!(store.get_str_list("tools"), vec!["a", "b"]);
        assert!(store.get_str_list("card").is_empty());
        assert!(store.get_bool("no-firmware"));
        assert!(store.get_bool("card"));
        assert!(!store.get_bool("missing"));
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut store = PropertyStore::new();
        store.insert("z", PropertyValue::Presence);
        store.insert("a", PropertyValue::Presence);
        let names: Vec<&String> = store.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["z", "a"]);
    }
}
