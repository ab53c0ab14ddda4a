//! Source loading
//!
//! Authored sources are read through a [`SourceLoader`] so the pipeline can
//! run against the filesystem or an in-memory set of files. Format is
//! detected from the file extension:
//! - `.yaml`, `.yml` -> YAML (anchors, aliases and `<<` merge keys applied)
//! - `.json` -> JSON

use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Format of an authored source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Detect the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }
}

/// Reads source text by path.
pub trait SourceLoader {
    /// Read the full text of `path`.
    fn read(&self, path: &Path) -> Result<String>;

    /// A stable key for `path`, used to detect import cycles.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        Ok(normalize(path))
    }
}

/// Loads sources from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn read(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        std::fs::canonicalize(path).map_err(|e| Error::io(path, e))
    }
}

/// Loads sources from an in-memory file set.
///
/// ```
/// use hwconfig_schema::loader::{MemoryLoader, SourceLoader};
/// use std::path::Path;
///
/// let loader = MemoryLoader::new().with_file("cfg/a.yaml", "a: 1\n");
/// assert_eq!(loader.read(Path::new("cfg/./a.yaml")).unwrap(), "a: 1\n");
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), text.into());
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn read(&self, path: &Path) -> Result<String> {
        self.files.get(&normalize(path)).cloned().ok_or_else(|| {
            Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such in-memory source"),
            )
        })
    }
}

/// Lexically normalize `path`, folding `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Parse source text into a document.
pub fn parse_source(path: &Path, format: Format, text: &str) -> Result<Value> {
    match format {
        Format::Json => {
            serde_json::from_str(text).map_err(|e| Error::parse(path, format.name(), e.to_string()))
        }
        Format::Yaml => {
            let mut yaml: serde_yaml::Value = serde_yaml::from_str(text)
                .map_err(|e| Error::parse(path, format.name(), e.to_string()))?;
            yaml.apply_merge()
                .map_err(|e| Error::parse(path, format.name(), e.to_string()))?;
            serde_json::to_value(yaml).map_err(|e| Error::parse(path, format.name(), e.to_string()))
        }
    }
}
