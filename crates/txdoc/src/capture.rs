//! Capture files written by a test harness.
//!
//! A capture file holds one entry or a JSON array of entries. Each entry
//! names its source kind:
//!
//! ```json
//! [
//!   {
//!     "source": "driver",
//!     "example": { "description": "returns the user",
//!                  "full_description": "GET /users/:id returns the user",
//!                  "file_path": "./tests/requests/users_test.rs" },
//!     "context": { "request": { "method": "GET", "env": { "HTTP_ACCEPT": "*/*" } },
//!                  "response": { "status": 200 } }
//!   },
//!   {
//!     "source": "transaction",
//!     "example": { "description": "deletes the user" },
//!     "transaction": { "method": "DELETE", "path": "/users/1", "status": 204 }
//!   }
//! ]
//! ```

use std::path::Path;

use serde::Deserialize;
use txdoc_core::{
    DocumentError, DocumentRenderer, DriverContext, EmbeddedDriverSource, ExampleMetadata,
    PrebuiltTransactionSource, RenderedDocument, Transaction,
};

use crate::error::CliError;

/// One recorded example.
#[derive(Debug, Deserialize)]
#[serde(try_from = "CaptureRecord")]
pub(crate) enum Capture {
    /// Raw driver context captured inside the test.
    Driver {
        example: ExampleMetadata,
        context: DriverContext,
    },
    /// Transaction assembled by the harness.
    Transaction {
        example: ExampleMetadata,
        transaction: Transaction,
        description: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SourceKind {
    Driver,
    Transaction,
}

/// Capture entry as written on disk.
///
/// Must stay a plain struct: internally tagged enums buffer their content,
/// and buffered numbers fail to deserialize under `arbitrary_precision`.
#[derive(Debug, Deserialize)]
struct CaptureRecord {
    source: SourceKind,
    example: ExampleMetadata,
    #[serde(default)]
    context: Option<DriverContext>,
    #[serde(default)]
    transaction: Option<Transaction>,
    #[serde(default)]
    description: Option<String>,
}

impl TryFrom<CaptureRecord> for Capture {
    type Error = String;

    fn try_from(record: CaptureRecord) -> Result<Self, Self::Error> {
        match record.source {
            SourceKind::Driver => Ok(Self::Driver {
                example: record.example,
                context: record
                    .context
                    .ok_or("driver capture requires `context`")?,
            }),
            SourceKind::Transaction => Ok(Self::Transaction {
                example: record.example,
                transaction: record
                    .transaction
                    .ok_or("transaction capture requires `transaction`")?,
                description: record.description,
            }),
        }
    }
}

impl Capture {
    pub(crate) fn example(&self) -> &ExampleMetadata {
        match self {
            Self::Driver { example, .. } | Self::Transaction { example, .. } => example,
        }
    }

    /// Render this capture with the matching transaction source.
    pub(crate) fn render(
        self,
        renderer: &DocumentRenderer<'_>,
    ) -> Result<RenderedDocument, DocumentError> {
        match self {
            Self::Driver { example, context } => {
                renderer.render(&EmbeddedDriverSource::new(context), &example)
            }
            Self::Transaction {
                example,
                transaction,
                description,
            } => {
                let mut source = PrebuiltTransactionSource::new(transaction);
                if let Some(description) = description {
                    source = source.with_description(description);
                }
                renderer.render(&source, &example)
            }
        }
    }
}

/// Parse capture file content: a single entry or an array of entries.
pub(crate) fn parse_captures(content: &str) -> Result<Vec<Capture>, serde_json::Error> {
    if content.trim_start().starts_with('[') {
        serde_json::from_str(content)
    } else {
        serde_json::from_str(content).map(|capture| vec![capture])
    }
}

/// Read and parse a capture file.
pub(crate) fn load_captures(path: &Path) -> Result<Vec<Capture>, CliError> {
    let content = std::fs::read_to_string(path)?;
    parse_captures(&content).map_err(|source| CliError::Capture {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use txdoc_core::{EmptyRegistry, Method, RenderConfig};

    const CAPTURES: &str = r#"[
  {
    "source": "driver",
    "example": {
      "description": "returns the user",
      "full_description": "GET /users/:id returns the user",
      "file_path": "./tests/requests/users_test.rs"
    },
    "context": {
      "request": {
        "method": "GET",
        "path_info": "/users/1",
        "env": { "HTTP_ACCEPT": "application/json" }
      },
      "response": {
        "status": 200,
        "headers": { "Content-Type": "application/json" },
        "body": { "text": "{\"id\":1}" }
      }
    }
  },
  {
    "source": "transaction",
    "example": {
      "description": "deletes the user",
      "file_path": "./tests/requests/users_test.rs"
    },
    "transaction": { "method": "DELETE", "path": "/users/1", "status": 204 },
    "description": "Removes the user."
  }
]"#;

    #[test]
    fn test_parse_captures_array() {
        let captures = parse_captures(CAPTURES).unwrap();
        assert_eq!(captures.len(), 2);
        assert!(matches!(captures[0], Capture::Driver { .. }));
        assert!(matches!(
            &captures[1],
            Capture::Transaction { transaction, .. } if transaction.method == Method::Delete
        ));
        assert_eq!(captures[1].example().description, "deletes the user");
    }

    #[test]
    fn test_parse_single_capture() {
        let single = r#"{
            "source": "transaction",
            "example": { "description": "lists users" },
            "transaction": { "method": "GET", "path": "/users", "status": 200 }
        }"#;
        assert_eq!(parse_captures(single).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_unknown_source() {
        let bad = r#"{ "source": "har", "example": { "description": "x" } }"#;
        assert!(parse_captures(bad).is_err());
    }

    #[test]
    fn test_parse_capture_missing_payload() {
        let bad = r#"{ "source": "transaction", "example": { "description": "x" } }"#;
        let err = parse_captures(bad).unwrap_err();
        assert!(err.to_string().contains("requires `transaction`"));
    }

    #[test]
    fn test_parse_capture_keeps_large_numbers_in_bodies() {
        let capture = r#"{
            "source": "transaction",
            "example": { "description": "returns the ledger" },
            "transaction": {
                "method": "GET",
                "path": "/ledger",
                "status": 200,
                "response": {
                    "body": {
                        "content_type": "application/json",
                        "text": "{\"balance\":123456789012345678901234567890}"
                    }
                }
            }
        }"#;
        let config = RenderConfig::default();
        let renderer = DocumentRenderer::new(&config, &EmptyRegistry);

        let document = parse_captures(capture)
            .unwrap()
            .remove(0)
            .render(&renderer)
            .unwrap();

        assert!(document.markdown.contains("HTTP/1.1 200\n"));
        assert!(document.markdown.contains("\"balance\": 123456789012345678901234567890"));
    }

    #[test]
    fn test_render_both_sources() {
        let config = RenderConfig::default();
        let renderer = DocumentRenderer::new(&config, &EmptyRegistry);

        let documents: Vec<RenderedDocument> = parse_captures(CAPTURES)
            .unwrap()
            .into_iter()
            .map(|capture| capture.render(&renderer).unwrap())
            .collect();

        assert_eq!(documents[0].title, "GET /users/:id");
        assert!(documents[0].markdown.contains("Accept: application/json"));
        assert!(documents[0].markdown.contains("\n  \"id\": 1\n"));
        assert_eq!(documents[1].title, "DELETE /users/1");
        assert!(documents[1].markdown.contains("Removes the user."));
        assert_eq!(documents[0].path, documents[1].path);
    }

    #[test]
    fn test_load_captures_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();

        let err = load_captures(&path).unwrap_err();
        assert!(matches!(err, CliError::Capture { .. }));
        assert!(err.to_string().contains("broken.json"));
    }
}
