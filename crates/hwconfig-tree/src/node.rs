//! Arena-allocated configuration nodes

use crate::property::PropertyStore;
use indexmap::IndexMap;

/// Index of a node in its [`ConfigTree`](crate::ConfigTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// A named node with ordered children and properties.
///
/// Parents own children through the arena; `default` is a plain id used
/// only for property fallback.
#[derive(Debug, Clone)]
pub struct ConfigNode {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: IndexMap<String, NodeId>,
    pub(crate) properties: PropertyStore,
    pub(crate) default: Option<NodeId>,
    pub(crate) submodels: IndexMap<String, NodeId>,
}

impl ConfigNode {
    pub(crate) fn new(name: impl Into<String>, path: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            parent,
            children: IndexMap::new(),
            properties: PropertyStore::new(),
            default: None,
            submodels: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path, e.g. `/chromeos/models/reef/audio`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.children.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn default(&self) -> Option<NodeId> {
        self.default
    }

    pub fn submodels(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.submodels.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
