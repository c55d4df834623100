//! CLI error types.

use std::path::PathBuf;

use txdoc_config::ConfigError;
use txdoc_core::{DocumentError, OutputError, RegistryError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Document(#[from] DocumentError),

    #[error("{0}")]
    Output(#[from] OutputError),

    #[error("invalid capture file {}: {source}", .path.display())]
    Capture {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Validation(String),
}
