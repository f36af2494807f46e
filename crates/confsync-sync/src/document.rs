//! Source documents.

use std::path::{Path, PathBuf};

use confsync_renderer::PageContext;

/// Where a document's markdown comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Markdown file on disk.
    File(PathBuf),
    /// Index synthesized for a directory without an index file; renders
    /// as empty markdown.
    Virtual,
}

/// A document that maps to one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub source: DocumentSource,
    /// Path relative to the source root, `/`-separated.
    pub identity: String,
    /// Page title.
    pub title: String,
    /// Whether this is its directory's index document.
    pub is_index: bool,
    /// Title of the page that owns this document's same-directory
    /// attachments: the directory's page for child documents, the parent
    /// directory's page for index documents (empty at the root).
    pub parent_title: String,
    /// Identity of the parent page's document; empty for the root index.
    pub parent_identity: String,
    /// Depth in the page tree; the root index is level 0.
    pub level: usize,
    /// Files uploaded with the page.
    pub attachments: Vec<PathBuf>,
}

impl SourceDocument {
    /// Render context for this document.
    pub fn context(&self) -> PageContext {
        PageContext::new(self.parent_title.clone(), self.is_index)
    }

    /// Markdown file path, if the document is backed by one.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            DocumentSource::File(path) => Some(path),
            DocumentSource::Virtual => None,
        }
    }
}
