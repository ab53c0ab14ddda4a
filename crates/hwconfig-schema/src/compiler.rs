//! The end-to-end compilation pipeline
//!
//! sources -> expansion (per file) -> merge (across files) -> schema gate
//! -> fleet validation -> optional build-only filtering.

use crate::document::{self, ROOT_KEY};
use crate::ec::{EcFeatureTable, ec_feature_table};
use crate::expand::{DeviceExpander, NameFilter};
use crate::filter::filter_build_elements;
use crate::identity::{IdentityEntry, identity_table};
use crate::imports::load_document;
use crate::loader::SourceLoader;
use crate::merge::MergeEngine;
use crate::schema::SchemaValidator;
use crate::template::TemplateExpander;
use crate::validate::Validator;
use crate::Result;
use serde_json::Value;
use std::path::Path;

/// Options controlling a compilation run
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Root key of every document
    pub root: String,
    /// Keep only records whose name matches this pattern at its start
    pub name_filter: Option<String>,
    /// Strip build-only elements from the output
    pub filter_build_elements: bool,
    /// Fixed cap on template fixed-point passes
    pub max_template_passes: Option<usize>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            root: ROOT_KEY.to_string(),
            name_filter: None,
            filter_build_elements: false,
            max_template_passes: None,
        }
    }
}

/// Result of a successful compilation
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    root: String,
    validated: Value,
    output: Value,
}

impl CompiledConfig {
    /// The merged, validated document before build-only filtering.
    pub fn validated(&self) -> &Value {
        &self.validated
    }

    /// The document to emit.
    pub fn output(&self) -> &Value {
        &self.output
    }

    pub fn into_output(self) -> Value {
        self.output
    }

    /// Records of the emitted document.
    pub fn records(&self) -> Result<&[Value]> {
        Ok(document::configs(&self.output, &self.root)?.as_slice())
    }

    /// Emitted document as key-sorted pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        document::to_pretty_json(&self.output)
    }

    pub fn identity_table(&self) -> Result<Vec<IdentityEntry>> {
        identity_table(&self.validated, &self.root)
    }

    pub fn ec_feature_table(&self) -> Result<EcFeatureTable> {
        ec_feature_table(&self.validated, &self.root)
    }
}

/// Runs the pipeline over sources read through a [`SourceLoader`].
pub struct Compiler<'a> {
    options: CompileOptions,
    loader: &'a dyn SourceLoader,
    schema: Option<(&'a Value, &'a dyn SchemaValidator)>,
}

impl<'a> Compiler<'a> {
    pub fn new(loader: &'a dyn SourceLoader, options: CompileOptions) -> Self {
        Self {
            options,
            loader,
            schema: None,
        }
    }

    /// Gate validation on `schema`, checked before fleet invariants.
    pub fn with_schema(mut self, schema: &'a Value, validator: &'a dyn SchemaValidator) -> Self {
        self.schema = Some((schema, validator));
        self
    }

    /// Compile the given authored sources, in order.
    pub fn compile<P: AsRef<Path>>(&self, paths: &[P]) -> Result<CompiledConfig> {
        let docs = paths
            .iter()
            .map(|path| load_document(self.loader, path.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.compile_documents(docs)
    }

    /// Compile already-parsed authored documents, in order.
    pub fn compile_documents(&self, docs: Vec<Value>) -> Result<CompiledConfig> {
        let root = self.options.root.as_str();
        let expander = self.expander()?;

        let expanded = docs
            .iter()
            .map(|doc| expander.expand_document(doc, root))
            .collect::<Result<Vec<_>>>()?;
        let merged = MergeEngine::new(root).merge_documents(expanded)?;

        if let Some((schema, validator)) = self.schema {
            validator.validate(schema, &merged)?;
        }
        Validator::new().validate(&merged, root)?;

        let mut output = merged.clone();
        if self.options.filter_build_elements {
            filter_build_elements(&mut output, root)?;
        }

        tracing::debug!(
            sources = docs.len(),
            records = document::configs(&output, root)?.len(),
            "Compilation finished"
        );
        Ok(CompiledConfig {
            root: root.to_string(),
            validated: merged,
            output,
        })
    }

    fn expander(&self) -> Result<DeviceExpander> {
        let templates = match self.options.max_template_passes {
            Some(passes) => TemplateExpander::with_max_passes(passes),
            None => TemplateExpander::new(),
        };
        let mut expander = DeviceExpander::new().with_templates(templates);
        if let Some(pattern) = &self.options.name_filter {
            expander = expander.with_name_filter(NameFilter::new(pattern.as_str())?);
        }
        Ok(expander)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::Error;
    use serde_json::json;

    #[test]
    fn test_schema_gate_runs_before_fleet_validation() {
        let loader = MemoryLoader::new();
        let schema = json!({});
        let gate = |_: &Value, _: &Value| -> Result<()> {
            Err(Error::SchemaValidationFailure {
                path: "/chromeos/configs/0".into(),
                message: "rejected".into(),
            })
        };
        let compiler = Compiler::new(&loader, CompileOptions::default()).with_schema(&schema, &gate);
        let dup = json!({"chromeos": {"configs": [{"name": "a"}, {"name": "b"}]}});
        let err = compiler.compile_documents(vec![dup]).unwrap_err();
        assert!(matches!(err, Error::SchemaValidationFailure { .. }));
    }

    #[test]
    fn test_filtering_keeps_validated_copy() {
        let loader = MemoryLoader::new();
        let options = CompileOptions {
            filter_build_elements: true,
            ..CompileOptions::default()
        };
        let doc = json!({"chromeos": {"configs": [
            {"name": "reef", "identity": {"sku-id": 1}, "firmware": {"image-name": "reef"}}
        ]}});
        let compiled = Compiler::new(&loader, options).compile_documents(vec![doc]).unwrap();
        assert!(compiled.records().unwrap()[0].get("firmware").is_none());
        assert!(compiled.validated()["chromeos"]["configs"][0].get("firmware").is_some());
    }
}
