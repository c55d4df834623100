//! Error types for document rendering.

use std::path::PathBuf;

/// Error that aborts rendering of a single document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The captured exchange lacks data every document needs.
    #[error("missing transaction data: {field}")]
    MissingTransactionData {
        /// Name of the absent accessor (e.g. "request", "method").
        field: &'static str,
    },

    /// The request method is not one of the documented verbs.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Template failed to parse or render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl DocumentError {
    pub(crate) fn missing(field: &'static str) -> Self {
        Self::MissingTransactionData { field }
    }
}

/// Error while building or loading a validator registry.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// A scalar parameter was declared with nested children.
    #[error("parameter `{key}` of type {kind} cannot have children")]
    ChildrenOnScalar {
        /// Key of the offending node (`<element>` for unnamed nodes).
        key: String,
        /// Declared type tag.
        kind: String,
    },

    /// Registry entry names an unknown HTTP method.
    #[error("unsupported HTTP method in registry: {0}")]
    UnsupportedMethod(String),

    /// I/O error reading a registry file.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error")]
    Yaml(#[from] serde_yaml::Error),
}

/// Error while writing rendered documents.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Failed to create a directory or write a file.
    #[error("failed to write {}", .path.display())]
    Write {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
