//! Tree of installed file paths

use std::collections::BTreeMap;

/// A directory or file in the installed-file tree. Children are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathComponent {
    pub name: String,
    pub children: BTreeMap<String, PathComponent>,
}

impl PathComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: BTreeMap::new(),
        }
    }

    /// Add a `/`-separated relative path below this component.
    pub fn add_path(&mut self, path: &str) {
        let (part, rest) = path.split_once('/').unwrap_or((path, ""));
        let child = self
            .children
            .entry(part.to_string())
            .or_insert_with(|| PathComponent::new(part));
        if !rest.is_empty() {
            child.add_path(rest);
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Visit this component and its descendants depth-first.
    ///
    /// The callback receives the component's path relative to the root,
    /// its depth and the component itself.
    ///
    /// ```
    /// use hwconfig_tree::file_tree::PathComponent;
    ///
    /// let mut root = PathComponent::new("");
    /// root.add_path("etc/cras/reef/dsp.ini");
    /// root.add_path("etc/dptf/reef.dv");
    ///
    /// let mut seen = Vec::new();
    /// root.walk(&mut |path, depth, _| seen.push(format!("{depth}:{path}")));
    /// assert_eq!(seen, vec![
    ///     "0:", "1:etc", "2:etc/cras", "3:etc/cras/reef", "4:etc/cras/reef/dsp.ini",
    ///     "2:etc/dptf", "3:etc/dptf/reef.dv",
    /// ]);
    /// ```
    pub fn walk(&self, f: &mut impl FnMut(&str, usize, &PathComponent)) {
        self.walk_from("", 0, f);
    }

    fn walk_from(&self, parent: &str, depth: usize, f: &mut impl FnMut(&str, usize, &PathComponent)) {
        let path = match (parent.is_empty(), self.name.is_empty()) {
            (true, _) => self.name.clone(),
            (false, true) => parent.to_string(),
            (false, false) => format!("{parent}/{}", self.name),
        };
        f(&path, depth, self);
        for child in self.children.values() {
            child.walk_from(&path, depth + 1, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_path_shares_prefixes() {
        let mut root = PathComponent::new("");
        root.add_path("lib/firmware/a.bin");
        root.add_path("lib/firmware/b.bin");
        let firmware = &root.children["lib"].children["firmware"];
        assert_eq!(firmware.children.len(), 2);
        assert!(firmware.children["a.bin"].is_leaf());
    }
}
