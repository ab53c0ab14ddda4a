//! Import resolution for authored YAML sources
//!
//! A source may begin a top-level block
//!
//! ```yaml
//! imports:
//!   - ../common/audio.yaml
//!   - fingerprint.yaml
//! ```
//!
//! Imports are paths relative to the importing file. They are concatenated
//! as raw text before parsing, so anchors defined in an imported file can
//! be aliased by the importer. Every transitive import precedes the file
//! that imports it; a file reached twice is included once.

use crate::loader::{Format, SourceLoader, parse_source};
use crate::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static IMPORTS_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^imports\s*:").unwrap());
static IMPORT_ENTRY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ *- (.*)$").unwrap());

/// The concatenated text of a source and its transitive imports
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    /// Files in concatenation order; the root file is last.
    pub files: Vec<PathBuf>,
    pub text: String,
}

/// Split the `imports:` block out of `text`.
///
/// Returns the declared import paths and the remaining text.
///
/// ```
/// use hwconfig_schema::imports::split_imports;
///
/// let (imports, rest) = split_imports("imports:\n  - a.yaml\n  - b.yaml\nchromeos: {}\n");
/// assert_eq!(imports, vec!["a.yaml", "b.yaml"]);
/// assert_eq!(rest, "chromeos: {}\n");
/// ```
pub fn split_imports(text: &str) -> (Vec<String>, String) {
    let mut imports = Vec::new();
    let mut rest = String::with_capacity(text.len());
    let mut in_block = false;
    let mut seen_block = false;

    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        if !seen_block && IMPORTS_HEADER.is_match(bare) {
            in_block = true;
            seen_block = true;
            continue;
        }
        if in_block {
            if let Some(caps) = IMPORT_ENTRY.captures(bare) {
                imports.push(caps[1].trim().to_string());
                continue;
            }
            in_block = false;
        }
        rest.push_str(line);
    }

    (imports, rest)
}

/// Resolve `path` and its transitive imports into one text.
pub fn resolve_imports(loader: &dyn SourceLoader, path: &Path) -> Result<ResolvedSource> {
    let mut resolver = Resolver {
        loader,
        stack: Vec::new(),
        included: HashSet::new(),
        files: Vec::new(),
        text: String::new(),
    };
    resolver.visit(path)?;

    tracing::debug!(root = ?path, files = resolver.files.len(), "Imports resolved");
    Ok(ResolvedSource {
        files: resolver.files,
        text: resolver.text,
    })
}

/// Load one authored source into a document.
///
/// YAML sources have their imports resolved first. JSON sources are parsed
/// as-is.
pub fn load_document(loader: &dyn SourceLoader, path: &Path) -> Result<Value> {
    let format = Format::from_path(path)?;
    let text = match format {
        Format::Yaml => resolve_imports(loader, path)?.text,
        Format::Json => loader.read(path)?,
    };
    let doc = parse_source(path, format, &text)?;
    tracing::debug!(?path, format = format.name(), "Source loaded");
    Ok(doc)
}

struct Resolver<'a> {
    loader: &'a dyn SourceLoader,
    stack: Vec<PathBuf>,
    included: HashSet<PathBuf>,
    files: Vec<PathBuf>,
    text: String,
}

impl Resolver<'_> {
    fn visit(&mut self, path: &Path) -> Result<()> {
        let key = self.loader.canonicalize(path)?;
        if self.stack.contains(&key) {
            let mut chain = self.stack.clone();
            chain.push(key);
            return Err(Error::ImportCycle { chain });
        }
        if self.included.contains(&key) {
            return Ok(());
        }

        let text = self.loader.read(path)?;
        let (imports, rest) = split_imports(&text);

        self.stack.push(key.clone());
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for import in &imports {
            self.visit(&base.join(import))?;
        }
        self.stack.pop();

        self.included.insert(key);
        self.files.push(path.to_path_buf());
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(&rest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_split_imports_keeps_text_without_block() {
        let (imports, rest) = split_imports("chromeos:\n  devices: []\n");
        assert!(imports.is_empty());
        assert_eq!(rest, "chromeos:\n  devices: []\n");
    }

    #[test]
    fn test_imports_precede_importer() {
        let loader = MemoryLoader::new()
            .with_file("cfg/main.yaml", "imports:\n  - common/a.yaml\n  - b.yaml\nmain: 1\n")
            .with_file("cfg/common/a.yaml", "imports:\n  - ../b.yaml\na: 1\n")
            .with_file("cfg/b.yaml", "b: 1\n");

        let resolved = resolve_imports(&loader, Path::new("cfg/main.yaml")).unwrap();
        assert_eq!(
            resolved.files,
            vec![
                PathBuf::from("cfg/common/../b.yaml"),
                PathBuf::from("cfg/common/a.yaml"),
                PathBuf::from("cfg/main.yaml"),
            ]
        );
        assert_eq!(resolved.text, "b: 1\na: 1\nmain: 1\n");
    }

    #[test]
    fn test_imported_anchors_are_visible() {
        let loader = MemoryLoader::new()
            .with_file("main.yaml", "imports:\n  - audio.yaml\nchromeos:\n  audio: *audio\n")
            .with_file("audio.yaml", "audio-common: &audio\n  card: bytcr\n");

        let doc = load_document(&loader, Path::new("main.yaml")).unwrap();
        assert_eq!(doc["chromeos"]["audio"], json!({"card": "bytcr"}));
    }

    #[test]
    fn test_import_cycle_is_reported() {
        let loader = MemoryLoader::new()
            .with_file("a.yaml", "imports:\n  - b.yaml\na: 1\n")
            .with_file("b.yaml", "imports:\n  - a.yaml\nb: 1\n");

        let err = resolve_imports(&loader, Path::new("a.yaml")).unwrap_err();
        match err {
            Error::ImportCycle { chain } => {
                assert_eq!(
                    chain,
                    vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml"), PathBuf::from("a.yaml")]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_json_sources_skip_import_handling() {
        let loader = MemoryLoader::new().with_file("a.json", r#"{"imports": ["x.yaml"]}"#);
        let doc = load_document(&loader, Path::new("a.json")).unwrap();
        assert_eq!(doc, json!({"imports": ["x.yaml"]}));
    }
}
