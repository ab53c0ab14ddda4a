//! Read-only query layer over compiled hardware configuration
//!
//! A [`ConfigTree`] is built once from a compiled document (or a raw node
//! document) and then answers build-time questions: which firmware to
//! fetch, which files to install and where.
//!
//! # Example
//!
//! ```
//! use hwconfig_tree::{ConfigSource, ConfigTree, TreeOptions};
//! use serde_json::json;
//!
//! let doc = json!({"chromeos": {"configs": [
//!     {"name": "reef", "thermal": {"dptf-dv": "reef/dptf.dv"}},
//!     {"name": "pyro", "thermal": {"dptf-dv": "pyro/dptf.dv"}},
//! ]}});
//! let tree = ConfigTree::from_document(&doc, TreeOptions::default()).unwrap();
//!
//! assert_eq!(tree.model_list(), vec!["pyro", "reef"]);
//! let thermal = tree.thermal_files().unwrap();
//! assert_eq!(thermal[0].dest, "/etc/dptf/pyro/dptf.dv");
//! ```

mod build;
pub mod error;
pub mod file_tree;
pub mod filename;
pub mod files;
pub mod firmware;
pub mod node;
pub mod options;
pub mod property;
pub mod source;
pub mod tree;

pub use error::{Error, Result};
pub use file_tree::PathComponent;
pub use files::{BaseFile, TouchFile};
pub use firmware::FirmwareInfo;
pub use node::{ConfigNode, NodeId};
pub use options::{BspDirs, FirmwareFilter, TreeOptions};
pub use property::{PropertyStore, PropertyValue};
pub use source::{BuildCombinations, ConfigSource};
pub use tree::{ConfigTree, ROOT_KEY};
