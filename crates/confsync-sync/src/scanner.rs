//! Document discovery by filesystem walking.
//!
//! Every directory under the source root is a page. Its index file supplies
//! the content; a directory without one gets a virtual index so the page tree
//! has no gaps. Every other markdown file is a child page of its directory.
//!
//! ```text
//! docs/                  -> "Docs"       index.md            level 0
//! +-- index.md
//! +-- intro.md           -> "intro"      intro.md            level 1
//! +-- assets/logo.png       (attachment of index.md)
//! +-- guide/             -> "guide"      guide/index.md      level 1 (virtual)
//!     +-- setup.md       -> "setup"      guide/setup.md      level 2
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use confsync_renderer::DEFAULT_ATTACHMENTS_DIR;

use crate::document::{DocumentSource, SourceDocument};
use crate::error::SyncError;

/// Default name of a directory's index document.
pub const DEFAULT_INDEX_NAME: &str = "index.md";

/// Discovers source documents under a directory.
#[derive(Debug, Clone)]
pub struct Scanner {
    source_dir: PathBuf,
    attachments_dir: String,
    index_name: String,
    root_title: String,
}

/// Directory being scanned and its place in the page tree.
struct DirContext<'a> {
    path: &'a Path,
    /// Path relative to the source root; empty for the root.
    rel: &'a str,
    depth: usize,
    title: &'a str,
    parent_identity: &'a str,
    parent_title: &'a str,
}

impl Scanner {
    /// Create a scanner for `source_dir` with default names.
    ///
    /// The root page is titled after the source directory.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        let source_dir = source_dir.into();
        let root_title = source_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source_dir,
            attachments_dir: DEFAULT_ATTACHMENTS_DIR.to_owned(),
            index_name: DEFAULT_INDEX_NAME.to_owned(),
            root_title,
        }
    }

    #[must_use]
    pub fn with_attachments_dir(mut self, name: impl Into<String>) -> Self {
        self.attachments_dir = name.into();
        self
    }

    #[must_use]
    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    #[must_use]
    pub fn with_root_title(mut self, title: impl Into<String>) -> Self {
        self.root_title = title.into();
        self
    }

    /// Scan the source directory.
    ///
    /// Documents are returned in hierarchy order: by level, then identity.
    /// Unreadable subdirectories are logged and skipped.
    pub fn scan(&self) -> Result<Vec<SourceDocument>, SyncError> {
        if !self.source_dir.is_dir() {
            return Err(SyncError::SourceNotFound(self.source_dir.clone()));
        }

        let mut documents = Vec::new();
        let root = DirContext {
            path: &self.source_dir,
            rel: "",
            depth: 0,
            title: &self.root_title,
            parent_identity: "",
            parent_title: "",
        };
        self.scan_directory(&root, &mut documents);

        documents.sort_by(|a, b| {
            a.level
                .cmp(&b.level)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        tracing::debug!(
            "scanned {} documents in {}",
            documents.len(),
            self.source_dir.display()
        );
        Ok(documents)
    }

    fn scan_directory(&self, dir: &DirContext<'_>, documents: &mut Vec<SourceDocument>) {
        let entries = match read_sorted(dir.path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("skipping unreadable directory {}: {e}", dir.path.display());
                return;
            }
        };

        let index_identity = join(dir.rel, &self.index_name);
        let mut index_path = None;
        let mut attachments = Vec::new();
        let mut subdirs = Vec::new();

        for (name, path, is_dir) in entries {
            if is_dir {
                if name == self.attachments_dir {
                    attachments.extend(attachment_files(&path));
                } else {
                    subdirs.push((name, path));
                }
            } else if name == self.index_name {
                index_path = Some(path);
            } else if is_markdown(&path) {
                let title = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                documents.push(SourceDocument {
                    source: DocumentSource::File(path),
                    identity: join(dir.rel, &name),
                    title,
                    is_index: false,
                    parent_title: dir.title.to_owned(),
                    parent_identity: index_identity.clone(),
                    level: dir.depth + 1,
                    attachments: Vec::new(),
                });
            } else {
                attachments.push(path);
            }
        }

        let source = match index_path {
            Some(path) => DocumentSource::File(path),
            None => DocumentSource::Virtual,
        };
        documents.push(SourceDocument {
            source,
            identity: index_identity.clone(),
            title: dir.title.to_owned(),
            is_index: true,
            parent_title: dir.parent_title.to_owned(),
            parent_identity: dir.parent_identity.to_owned(),
            level: dir.depth,
            attachments,
        });

        for (name, path) in subdirs {
            let rel = join(dir.rel, &name);
            let child = DirContext {
                path: &path,
                rel: &rel,
                depth: dir.depth + 1,
                title: &name,
                parent_identity: &index_identity,
                parent_title: dir.title,
            };
            self.scan_directory(&child, documents);
        }
    }
}

/// Non-hidden entries of a directory as (name, path, `is_dir`), sorted by name.
fn read_sorted(dir: &Path) -> std::io::Result<Vec<(String, PathBuf, bool)>> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| {
            let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
            (e.file_name().to_string_lossy().into_owned(), e.path(), is_dir)
        })
        .filter(|(name, _, _)| !name.starts_with('.'))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Non-markdown files directly inside an attachments folder.
fn attachment_files(dir: &Path) -> Vec<PathBuf> {
    match read_sorted(dir) {
        Ok(entries) => entries
            .into_iter()
            .filter(|(_, path, is_dir)| !is_dir && !is_markdown(path))
            .map(|(_, path, _)| path)
            .collect(),
        Err(e) => {
            tracing::warn!("skipping unreadable attachments folder {}: {e}", dir.display());
            Vec::new()
        }
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "md")
}

fn join(rel: &str, name: &str) -> String {
    if rel.is_empty() {
        name.to_owned()
    } else {
        format!("{rel}/{name}")
    }
}
