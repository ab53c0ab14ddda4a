//! Error types for hwconfig-tree

/// Result type for hwconfig-tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or querying a tree
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Colliding firmware combinations found for key {key}: {first:?}, {second:?}")]
    CollidingFirmwareCombination {
        key: String,
        first: Vec<Option<String>>,
        second: Vec<Option<String>>,
    },

    #[error("node '{node}': Format string '{template}' has properties {available:?} but lacks '{missing}'")]
    MissingRequiredField {
        node: String,
        template: String,
        available: Vec<String>,
        missing: String,
    },

    #[error("node '{node}': Missing property '{property}'")]
    MissingProperty { node: String, property: String },

    #[error("node '{node}': Property '{property}' does not have a target directory")]
    MissingTargetDir { node: String, property: String },

    #[error("Cannot locate {purpose} unless {variable} is defined")]
    MissingBspDir {
        variable: &'static str,
        purpose: &'static str,
    },

    #[error("Invalid document: {message}")]
    InvalidDocument { message: String },
}

impl Error {
    pub fn missing_property(node: impl Into<String>, property: impl Into<String>) -> Self {
        Self::MissingProperty {
            node: node.into(),
            property: property.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}
