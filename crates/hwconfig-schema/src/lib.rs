//! Compilation of authored hardware configuration
//!
//! Authored sources describe a fleet as devices, products and SKUs with
//! `{{var}}` templates. This crate expands them into flat per-variant
//! records, merges records across sources, and enforces fleet-wide
//! invariants.
//!
//! # Example
//!
//! ```
//! use hwconfig_schema::{CompileOptions, Compiler, MemoryLoader};
//!
//! let loader = MemoryLoader::new().with_file("reef.yaml", r#"
//! chromeos:
//!   devices:
//!     - $name: reef
//!       skus:
//!         - $sku-id: 4
//!           config:
//!             name: "{{$name}}"
//!             identity:
//!               sku-id: "{{$sku-id}}"
//! "#);
//!
//! let compiled = Compiler::new(&loader, CompileOptions::default())
//!     .compile(&["reef.yaml"])
//!     .unwrap();
//! let record = &compiled.records().unwrap()[0];
//! assert_eq!(record["name"], "reef");
//! assert_eq!(record["identity"]["sku-id"], 4);
//! ```

pub mod compiler;
pub mod document;
pub mod ec;
pub mod error;
pub mod expand;
pub mod filter;
pub mod identity;
pub mod imports;
pub mod loader;
pub mod merge;
pub mod path;
pub mod schema;
pub mod template;
pub mod validate;

pub use compiler::{CompileOptions, CompiledConfig, Compiler};
pub use ec::{EcFeatureTable, ec_feature_table};
pub use error::{Error, Result};
pub use expand::{DeviceExpander, NameFilter};
pub use identity::{IdentityEntry, identity_table};
pub use loader::{FsLoader, MemoryLoader, SourceLoader};
pub use merge::MergeEngine;
pub use schema::{AcceptAll, SchemaValidator, valid_schema_properties};
pub use template::{TemplateExpander, TemplateScope};
pub use validate::Validator;
