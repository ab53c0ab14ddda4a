//! Error types for hwconfig-schema

use std::path::PathBuf;

/// Result type for hwconfig-schema operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a compilation run.
///
/// Every variant is fatal: the compiler never emits partial output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "Referenced template variable '{variable}' doesn't exist in string '{value}'.\nInput:\n{input}\nVariables:\n{scope}"
    )]
    UndefinedTemplateVariable {
        variable: String,
        value: String,
        input: String,
        scope: String,
    },

    #[error("Template variables never reach a fixed point after {passes} passes: {unresolved:?}")]
    CyclicTemplateVariable {
        passes: usize,
        unresolved: Vec<String>,
    },

    #[error("Identities are not unique: {duplicates:?}")]
    DuplicateIdentity { duplicates: Vec<String> },

    #[error(
        "Whitelabel configs can only change branding attributes ({brand_elements}).\nHowever, the device {group} differs by other attributes.\nExample 1: {first}\nExample 2: {second}\n{diff}"
    )]
    WhitelabelScopeViolation {
        group: String,
        brand_elements: String,
        first: String,
        second: String,
        diff: String,
    },

    #[error(
        "All configs under hardware-properties must be boolean flags\nHowever, key '{key}' has value '{value}'."
    )]
    InvalidHardwarePropertyType { key: String, value: String },

    #[error("Schema validation failed at '{path}': {message}")]
    SchemaValidationFailure { path: String, message: String },

    #[error("Missing required field '{field}' in {context}")]
    MissingRequiredField { field: String, context: String },

    #[error("Import cycle detected: {}", chain.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(" -> "))]
    ImportCycle { chain: Vec<PathBuf> },

    #[error("Invalid document: {message}")]
    InvalidDocument { message: String },

    #[error("Failed to parse {format} source {path}: {message}")]
    Parse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported source format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid model filter '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn missing(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
            context: context.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            format: format.into(),
            message: message.into(),
        }
    }
}
