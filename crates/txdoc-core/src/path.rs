//! Mapping from a test file to the Markdown file documenting it.

use std::path::{Path, PathBuf};

use regex::Regex;

/// Default pattern: `./tests/<group>/<name>_test.rs`.
pub const DEFAULT_PATH_PATTERN: &str = r"^\./tests/[^/]+/(.+)_test\.rs$";

/// Default replacement producing `<name>.md`.
pub const DEFAULT_PATH_REPLACEMENT: &str = "$1.md";

/// Regex-based rewrite of a test file path into a document path.
///
/// Paths the pattern does not match fall back to `<file stem>.md`.
#[derive(Debug, Clone)]
pub struct PathMapping {
    pattern: Regex,
    replacement: String,
}

impl PathMapping {
    /// Create a mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regex.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_owned(),
        })
    }

    /// Document path (relative to the output root) for a test file.
    #[must_use]
    pub fn map(&self, file_path: &Path) -> PathBuf {
        let source = file_path.to_string_lossy();
        if self.pattern.is_match(&source) {
            return PathBuf::from(
                self.pattern
                    .replace(&source, self.replacement.as_str())
                    .into_owned(),
            );
        }

        let stem = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_owned());
        PathBuf::from(format!("{stem}.md"))
    }
}

impl Default for PathMapping {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_PATH_PATTERN).expect("invalid default path pattern"),
            replacement: DEFAULT_PATH_REPLACEMENT.to_owned(),
        }
    }
}
