//! Collecting rendered documents into output files.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::RenderedDocument;
use crate::error::OutputError;

/// Name of the generated table of contents.
pub const TOC_FILENAME: &str = "toc.md";

/// Rendered documents grouped by output file, in insertion order.
///
/// Several examples usually document endpoints of the same test file; their
/// documents are concatenated into one Markdown file.
#[derive(Debug, Default)]
pub struct DocumentSet {
    files: Vec<(PathBuf, Vec<RenderedDocument>)>,
}

impl DocumentSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document to the file it belongs to.
    pub fn push(&mut self, document: RenderedDocument) {
        match self.files.iter_mut().find(|(path, _)| *path == document.path) {
            Some((_, documents)) => documents.push(document),
            None => self.files.push((document.path.clone(), vec![document])),
        }
    }

    /// Number of documents across all files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.iter().map(|(_, documents)| documents.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Relative output paths, in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(path, _)| path.as_path())
    }

    /// Markdown content of one output file.
    #[must_use]
    pub fn content(&self, path: &Path) -> Option<String> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, documents)| join_documents(documents))
    }

    /// Table of contents linking every document.
    #[must_use]
    pub fn toc(&self) -> String {
        let mut out = String::from("## Table of Contents\n");
        for (path, documents) in &self.files {
            let link = path.to_string_lossy().replace('\\', "/");
            let _ = writeln!(out, "* [{link}]({link})");
            for document in documents {
                let _ = writeln!(
                    out,
                    "  * [{}]({link}#{})",
                    document.title, document.identifier
                );
            }
        }
        out
    }

    /// Write every file (and optionally the table of contents) under `root`.
    ///
    /// Returns the absolute paths written.
    ///
    /// # Errors
    ///
    /// Returns `OutputError::Write` if a directory or file cannot be written.
    pub fn write_all(&self, root: &Path, with_toc: bool) -> Result<Vec<PathBuf>, OutputError> {
        let mut written = Vec::with_capacity(self.files.len() + 1);

        for (path, documents) in &self.files {
            let target = root.join(path);
            write_file(&target, &join_documents(documents))?;
            tracing::info!(path = %target.display(), documents = documents.len(), "Wrote document");
            written.push(target);
        }

        if with_toc {
            let target = root.join(TOC_FILENAME);
            write_file(&target, &self.toc())?;
            tracing::info!(path = %target.display(), "Wrote table of contents");
            written.push(target);
        }

        Ok(written)
    }
}

fn join_documents(documents: &[RenderedDocument]) -> String {
    documents
        .iter()
        .map(|document| document.markdown.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_file(target: &Path, content: &str) -> Result<(), OutputError> {
    let to_error = |source: std::io::Error| OutputError::Write {
        path: target.to_path_buf(),
        source,
    };
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(target, content).map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn document(path: &str, title: &str, markdown: &str) -> RenderedDocument {
        RenderedDocument {
            path: PathBuf::from(path),
            title: title.to_owned(),
            identifier: crate::identifier(title),
            markdown: markdown.to_owned(),
        }
    }

    #[test]
    fn test_push_groups_by_path() {
        let mut set = DocumentSet::new();
        set.push(document("users.md", "GET /users", "a\n"));
        set.push(document("posts.md", "GET /posts", "b\n"));
        set.push(document("users.md", "POST /users", "c\n"));

        assert_eq!(set.len(), 3);
        assert_eq!(
            set.paths().collect::<Vec<_>>(),
            vec![Path::new("users.md"), Path::new("posts.md")]
        );
        assert_eq!(set.content(Path::new("users.md")).unwrap(), "a\n\nc\n");
        assert!(set.content(Path::new("missing.md")).is_none());
    }

    #[test]
    fn test_toc() {
        let mut set = DocumentSet::new();
        set.push(document("admin/users.md", "GET /users/:id", "a"));
        set.push(document("admin/users.md", "DELETE /users/:id", "b"));

        assert_eq!(
            set.toc(),
            "## Table of Contents\n\
             * [admin/users.md](admin/users.md)\n\
             \x20 * [GET /users/:id](admin/users.md#get-usersid)\n\
             \x20 * [DELETE /users/:id](admin/users.md#delete-usersid)\n"
        );
    }

    #[test]
    fn test_write_all_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = DocumentSet::new();
        set.push(document("api/users.md", "GET /users", "# users\n"));

        let written = set.write_all(dir.path(), true).unwrap();

        assert_eq!(
            written,
            vec![dir.path().join("api/users.md"), dir.path().join("toc.md")]
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("api/users.md")).unwrap(),
            "# users\n"
        );
        assert!(
            fs::read_to_string(dir.path().join("toc.md"))
                .unwrap()
                .contains("(api/users.md#get-users)")
        );
    }

    #[test]
    fn test_write_all_without_toc() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = DocumentSet::new();
        set.push(document("users.md", "GET /users", "x"));

        let written = set.write_all(dir.path(), false).unwrap();

        assert_eq!(written.len(), 1);
        assert!(!dir.path().join(TOC_FILENAME).exists());
    }

    #[test]
    fn test_write_all_reports_failing_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blocker"), "file").unwrap();
        let mut set = DocumentSet::new();
        set.push(document("blocker/users.md", "GET /users", "x"));

        let err = set.write_all(dir.path(), false).unwrap_err();

        let OutputError::Write { path, .. } = err;
        assert_eq!(path, dir.path().join("blocker/users.md"));
    }
}
