//! The read-only configuration tree and its path resolution
//!
//! Lookups honour two kinds of indirection:
//! - link properties (`shares`, `whitelabel`, ...) let a node borrow the
//!   children and properties of another node
//! - a model's `default` model supplies any property the model lacks

use crate::build::{MODELS, TreeBuilder};
use crate::node::{ConfigNode, NodeId};
use crate::options::TreeOptions;
use crate::property::PropertyValue;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeMap;

/// Root key of compiled documents
pub const ROOT_KEY: &str = "chromeos";

/// Properties never copied by [`ConfigTree::merged_properties`]
const UNMERGED_PROPERTIES: &[&str] = &["bcs-type", "reg"];

/// An immutable node arena built once from a document.
///
/// ```
/// use hwconfig_tree::{ConfigTree, TreeOptions};
/// use serde_json::json;
///
/// let tree = ConfigTree::from_document(
///     &json!({"chromeos": {"configs": [{"name": "reef", "audio": {"main": {"card": "bxt"}}}]}}),
///     TreeOptions::default(),
/// ).unwrap();
/// let card = tree.get_property("/chromeos/models/reef/audio/main", "card").unwrap();
/// assert_eq!(card.as_str(), Some("bxt"));
/// ```
#[derive(Debug, Clone)]
pub struct ConfigTree {
    nodes: Vec<ConfigNode>,
    root_key: String,
    models: IndexMap<String, NodeId>,
    options: TreeOptions,
}

impl ConfigTree {
    /// Build a tree from a compiled document or a raw node document.
    ///
    /// A document whose root holds a `configs` list is treated as compiled
    /// output; anything else is mirrored node for node.
    pub fn from_document(doc: &Value, options: TreeOptions) -> Result<Self> {
        let body = doc
            .get(ROOT_KEY)
            .and_then(Value::as_object)
            .ok_or_else(|| Error::invalid(format!("missing '{ROOT_KEY}' map")))?;

        match body.get("configs") {
            Some(Value::Array(records)) => Self::from_configs(records, options),
            Some(_) => Err(Error::invalid(format!("'{ROOT_KEY}/configs' must be a list"))),
            None => {
                let mut builder = TreeBuilder::new();
                if let Value::Object(map) = doc {
                    let root = builder.root();
                    builder.add_map(root, map);
                }
                Self::finish(builder, options)
            }
        }
    }

    /// Build a tree with one model per distinct record name.
    pub fn from_configs(records: &[Value], options: TreeOptions) -> Result<Self> {
        let mut builder = TreeBuilder::new();
        builder.add_configs(ROOT_KEY, records)?;
        Self::finish(builder, options)
    }

    fn finish(mut builder: TreeBuilder, options: TreeOptions) -> Result<Self> {
        let models = builder.link_models(ROOT_KEY)?;
        tracing::debug!(nodes = builder.nodes.len(), models = models.len(), "Config tree built");
        Ok(Self {
            nodes: builder.nodes,
            root_key: ROOT_KEY.to_string(),
            models,
            options,
        })
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrow a node. Ids are only minted by this tree.
    pub fn node(&self, id: NodeId) -> &ConfigNode {
        &self.nodes[id.0]
    }

    pub fn model(&self, name: &str) -> Option<NodeId> {
        self.models.get(name).copied()
    }

    /// Models in document order.
    pub fn models(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.models.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Model names, sorted.
    pub fn model_list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve an absolute path from the root.
    pub fn get_node(&self, path: &str) -> Option<NodeId> {
        self.path_node(self.root(), path)
    }

    /// Read a property at an absolute path.
    pub fn get_property(&self, path: &str, name: &str) -> Option<&PropertyValue> {
        self.path_property(self.root(), path, name)
    }

    /// Walk `relative_path` from `from`.
    ///
    /// A segment that is not a direct child is looked up among the children
    /// of the node's share target instead. Missing paths yield `None`.
    pub fn path_node(&self, from: NodeId, relative_path: &str) -> Option<NodeId> {
        let mut current = from;
        for part in relative_path.split('/').filter(|p| !p.is_empty()) {
            current = match self.node(current).child(part) {
                Some(child) => child,
                None => {
                    let shared = self.follow_share(current)?;
                    self.node(shared).child(part)?
                }
            };
        }
        Some(current)
    }

    /// Read `name` at `relative_path` from `from`.
    ///
    /// Falls back in order: the share target of `from` when the path is
    /// missing, the share target of the found node when it lacks the
    /// property, then the whole lookup on `from`'s default model.
    pub fn path_property(&self, from: NodeId, relative_path: &str, name: &str) -> Option<&PropertyValue> {
        let found = self
            .path_node(from, relative_path)
            .or_else(|| self.follow_share(from).and_then(|s| self.path_node(s, relative_path)));

        if let Some(node) = found {
            let prop = self.node(node).properties.get(name).or_else(|| {
                self.follow_share(node)
                    .and_then(|shared| self.node(shared).properties.get(name))
            });
            if prop.is_some() {
                return prop;
            }
        }

        let default = self.node(from).default?;
        self.path_property(default, relative_path, name)
    }

    /// Follow the first link property present on `id`.
    pub fn follow_share(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        let link = self
            .options
            .link_properties
            .iter()
            .find(|p| node.properties.contains(p) || node.children.contains_key(p.as_str()))?;
        self.follow_link(id, link)
    }

    /// Follow the link property `link` of `id`.
    ///
    /// A string value is an absolute path when it starts with `/`, otherwise
    /// a path below the models node. A link expanded in place as a child
    /// node resolves to that child.
    pub fn follow_link(&self, id: NodeId, link: &str) -> Option<NodeId> {
        let node = self.node(id);
        match node.properties.get(link) {
            Some(PropertyValue::Str(target)) => self.resolve_link(target),
            _ => node.child(link),
        }
    }

    fn resolve_link(&self, target: &str) -> Option<NodeId> {
        let start = if target.starts_with('/') {
            self.root()
        } else {
            self.lookup(self.root(), &format!("{}/{MODELS}", self.root_key))?
        };
        self.lookup(start, target)
    }

    /// Strict child walk, no link following.
    fn lookup(&self, from: NodeId, path: &str) -> Option<NodeId> {
        path.split('/')
            .filter(|p| !p.is_empty())
            .try_fold(from, |current, part| self.node(current).child(part))
    }

    /// Properties of `node` merged with those of the node it links to.
    ///
    /// The node's own properties win; the linked node fills gaps, then the
    /// node at the same subpath in the default of `model`, then that node's
    /// link target. The link property itself, `bcs-type` and `reg` are
    /// left out.
    pub fn merged_properties(&self, model: NodeId, node: NodeId, link: &str) -> BTreeMap<String, PropertyValue> {
        let mut props: BTreeMap<String, PropertyValue> = self
            .node(node)
            .properties
            .iter()
            .filter(|(name, _)| name.as_str() != link && !UNMERGED_PROPERTIES.contains(&name.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        self.merge_into(&mut props, self.follow_link(node, link), "bcs-type");

        if let Some(default) = self.node(model).default {
            let model_path = self.node(model).path();
            let subpath = self
                .node(node)
                .path()
                .strip_prefix(model_path)
                .filter(|rest| rest.is_empty() || rest.starts_with('/'));
            if let Some(default_node) = subpath.and_then(|sub| self.path_node(default, sub)) {
                self.merge_into(&mut props, Some(default_node), link);
                self.merge_into(&mut props, self.follow_link(default_node, link), "");
            }
        }

        props
    }

    pub(crate) fn merge_into(&self, props: &mut BTreeMap<String, PropertyValue>, source: Option<NodeId>, ignore: &str) {
        let Some(source) = source else {
            return;
        };
        for (name, value) in self.node(source).properties.iter() {
            if name != ignore && !props.contains_key(name) {
                props.insert(name.clone(), value.clone());
            }
        }
    }

    /// Node at `relative_path` below `/<root>/family`.
    pub fn family_node(&self, relative_path: &str) -> Option<NodeId> {
        let family = self.lookup(self.root(), &format!("{}/family", self.root_key))?;
        self.path_node(family, relative_path)
    }

    pub fn family_property(&self, relative_path: &str, name: &str) -> Option<&PropertyValue> {
        let family = self.lookup(self.root(), &format!("{}/family", self.root_key))?;
        self.path_property(family, relative_path, name)
    }

    /// Packer script of the family firmware, e.g. `updater4.sh`.
    pub fn firmware_script(&self) -> Option<&str> {
        self.family_property("/firmware", "script")
            .and_then(PropertyValue::as_str)
    }

    /// Read a property of one of `model`'s submodels.
    pub fn submodel_path_property(
        &self,
        model: NodeId,
        submodel: &str,
        relative_path: &str,
        name: &str,
    ) -> Option<&PropertyValue> {
        let submodel = self.node(model).submodels.get(submodel).copied()?;
        self.path_property(submodel, relative_path, name)
    }

    /// `relative_path` resolved in `model` and each of its submodels,
    /// keyed by model or submodel name.
    pub fn all_path_nodes(&self, model: NodeId, relative_path: &str) -> IndexMap<String, NodeId> {
        let mut nodes = IndexMap::new();
        if let Some(found) = self.path_node(model, relative_path) {
            nodes.insert(self.node(model).name.clone(), found);
        }
        for (name, submodel) in self.node(model).submodels() {
            if let Some(found) = self.path_node(submodel, relative_path) {
                nodes.insert(name.to_string(), found);
            }
        }
        nodes
    }

    /// Install path of a file-valued property: target directory joined
    /// with the property value.
    pub fn abs_path(&self, model: NodeId, relative_path: &str, name: &str) -> Result<Option<String>> {
        let Some(value) = self.path_property(model, relative_path, name) else {
            return Ok(None);
        };
        let target = self
            .options
            .target_dir(name)
            .ok_or_else(|| Error::MissingTargetDir {
                node: format!("{}{}", self.node(model).path(), relative_path),
                property: name.to_string(),
            })?;
        Ok(Some(crate::files::join_path(&[target, &value.to_string()])))
    }
}
