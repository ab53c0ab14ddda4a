//! Tree construction from JSON documents
//!
//! Maps become nodes and scalars become properties:
//! - strings and numbers -> string properties
//! - `true` -> presence property (`false` and `null` are omitted)
//! - lists of scalars -> string-list properties
//! - lists of maps -> a node whose children are named by each item's
//!   `name` field, or its index

use crate::node::{ConfigNode, NodeId};
use crate::property::PropertyValue;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub(crate) const MODELS: &str = "models";
pub(crate) const WHITELABELS: &str = "whitelabels";
pub(crate) const SUBMODELS: &str = "submodels";
pub(crate) const DEFAULT: &str = "default";

pub(crate) struct TreeBuilder {
    pub(crate) nodes: Vec<ConfigNode>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![ConfigNode::new("", "/", None)],
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Get or create the child `name` of `parent`.
    pub(crate) fn add_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        if let Some(existing) = self.nodes[parent.0].child(name) {
            return existing;
        }
        let parent_path = &self.nodes[parent.0].path;
        let path = if parent_path == "/" {
            format!("/{name}")
        } else {
            format!("{parent_path}/{name}")
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(ConfigNode::new(name, path, Some(parent)));
        self.nodes[parent.0].children.insert(name.to_string(), id);
        id
    }

    pub(crate) fn add_map(&mut self, node: NodeId, map: &Map<String, Value>) {
        for (key, value) in map {
            self.add_value(node, key, value);
        }
    }

    fn add_value(&mut self, node: NodeId, key: &str, value: &Value) {
        match value {
            Value::Object(map) => {
                let child = self.add_child(node, key);
                self.add_map(child, map);
            }
            Value::Array(items) if items.iter().any(Value::is_object) => {
                let list = self.add_child(node, key);
                for (idx, item) in items.iter().enumerate() {
                    if let Value::Object(map) = item {
                        let name = map
                            .get("name")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| idx.to_string());
                        let child = self.add_child(list, &name);
                        self.add_map(child, map);
                    }
                }
            }
            Value::Array(items) => {
                let list = items.iter().filter_map(scalar_text).collect();
                self.set(node, key, PropertyValue::StrList(list));
            }
            Value::String(s) => self.set(node, key, PropertyValue::Str(s.clone())),
            Value::Number(n) => self.set(node, key, PropertyValue::Str(n.to_string())),
            Value::Bool(true) => self.set(node, key, PropertyValue::Presence),
            Value::Bool(false) | Value::Null => {}
        }
    }

    pub(crate) fn set(&mut self, node: NodeId, key: &str, value: PropertyValue) {
        self.nodes[node.0].properties.insert(key, value);
    }

    /// Add one model per distinct record name under `/<root>/models`.
    ///
    /// Further records sharing a name that carry a whitelabel tag are
    /// recorded under the model's `whitelabels` node; other repeats are
    /// ignored.
    pub(crate) fn add_configs(&mut self, root_key: &str, records: &[Value]) -> Result<()> {
        let root = self.add_child(self.root(), root_key);
        let models = self.add_child(root, MODELS);

        let mut groups: IndexMap<&str, Vec<&Map<String, Value>>> = IndexMap::new();
        for (idx, record) in records.iter().enumerate() {
            let record = record
                .as_object()
                .ok_or_else(|| Error::invalid(format!("config #{idx} must be a map")))?;
            let Some(name) = record.get("name").and_then(Value::as_str) else {
                tracing::warn!(index = idx, "Config without a name, skipping");
                continue;
            };
            groups.entry(name).or_default().push(record);
        }

        for (name, group) in groups {
            let model = self.add_child(models, name);
            self.add_map(model, group[0]);
            if group.len() < 2 {
                continue;
            }

            for record in group.iter() {
                match whitelabel_tag(record) {
                    Some(tag) => {
                        let whitelabels = self.add_child(model, WHITELABELS);
                        let node = self.add_child(whitelabels, tag);
                        self.add_branding(node, record);
                    }
                    None => tracing::debug!(model = name, "Ignoring repeated config"),
                }
            }
        }
        Ok(())
    }

    fn add_branding(&mut self, node: NodeId, record: &Map<String, Value>) {
        if let Some(brand) = record.get("brand-code") {
            self.add_value(node, "brand-code", brand);
        }
        if let Some(Value::Object(signing)) = record.get("firmware-signing") {
            for (key, value) in signing {
                if !value.is_object() {
                    self.add_value(node, key, value);
                }
            }
        }
    }

    /// Resolve model defaults and submodels. Returns the model index.
    pub(crate) fn link_models(&mut self, root_key: &str) -> Result<IndexMap<String, NodeId>> {
        let models_node = self.nodes[self.root().0]
            .child(root_key)
            .and_then(|root| self.nodes[root.0].child(MODELS));
        let Some(models_node) = models_node else {
            return Ok(IndexMap::new());
        };

        let models: IndexMap<String, NodeId> = self.nodes[models_node.0]
            .children
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();

        for (name, &id) in &models {
            let target = self.nodes[id.0]
                .properties
                .get(DEFAULT)
                .and_then(PropertyValue::as_str)
                .map(str::to_string);
            if let Some(target) = target {
                let default = models.get(&target).copied().ok_or_else(|| {
                    Error::invalid(format!("model '{name}' has unknown default model '{target}'"))
                })?;
                self.nodes[id.0].default = Some(default);
            }

            if let Some(submodels) = self.nodes[id.0].child(SUBMODELS) {
                let entries: IndexMap<String, NodeId> = self.nodes[submodels.0]
                    .children
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect();
                self.nodes[id.0].submodels = entries;
            }
        }

        for (name, &id) in &models {
            let mut seen = HashSet::from([id]);
            let mut current = self.nodes[id.0].default;
            while let Some(next) = current {
                if !seen.insert(next) {
                    return Err(Error::invalid(format!(
                        "default models of '{name}' form a cycle"
                    )));
                }
                current = self.nodes[next.0].default;
            }
        }

        Ok(models)
    }
}

fn whitelabel_tag(record: &Map<String, Value>) -> Option<&str> {
    record
        .get("identity")
        .and_then(|identity| identity.get("whitelabel-tag"))
        .and_then(Value::as_str)
        .filter(|tag| !tag.is_empty())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
