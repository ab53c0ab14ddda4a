//! [`FixtureDir`] for tests that read sources from disk.

use crate::fixtures::{FLEET_SOURCES, RAW_TREE_JSON, SCHEMA_JSON};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory populated with fixture files.
///
/// # Example
///
/// ```rust
/// use hwconfig_test_utils::dir::FixtureDir;
///
/// let dir = FixtureDir::with_fleet();
/// assert!(dir.path("fleet.yaml").exists());
/// assert!(dir.path("common/firmware.yaml").exists());
/// ```
pub struct FixtureDir {
    temp_dir: TempDir,
}

impl Default for FixtureDir {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureDir {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Directory holding the authored fleet, its overlay, the schema and
    /// the raw tree (`raw_tree.json`).
    pub fn with_fleet() -> Self {
        let dir = Self::new();
        for (path, contents) in FLEET_SOURCES {
            dir.write(path, contents);
        }
        dir.write("schema.json", SCHEMA_JSON);
        dir.write("raw_tree.json", RAW_TREE_JSON);
        dir
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the directory.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("FixtureDir::read: {relative}: {e}"))
    }

    /// Assert that `relative` exists.
    pub fn assert_file_exists(&self, relative: &str) {
        assert!(self.path(relative).exists(), "expected file to exist: {relative}");
    }
}
