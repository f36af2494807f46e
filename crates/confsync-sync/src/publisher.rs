//! Publishing boundary.
//!
//! A [`Publisher`] turns a rendered page into a remote page and reports its
//! id. [`DirectoryPublisher`] stages pages on disk in the layout an upload
//! step consumes:
//!
//! ```text
//! {out_dir}/
//! +-- {page-id}/
//!     +-- page.xml         # storage-format body
//!     +-- page.json        # title, parentId, identity
//!     +-- attachments/     # files uploaded with the page
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

/// Page ready to publish.
#[derive(Debug, Clone, Copy)]
pub struct PageDraft<'a> {
    /// Source document identity.
    pub identity: &'a str,
    pub title: &'a str,
    /// Remote id of the parent page; empty for a top-level page.
    pub parent_id: &'a str,
    /// Remote id of the page when updating, `None` when creating.
    pub page_id: Option<&'a str>,
    /// Storage-format body.
    pub body: &'a str,
    pub attachments: &'a [PathBuf],
}

/// Error returned by a [`Publisher`].
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode page metadata: {0}")]
    Encode(#[from] serde_json::Error),

    /// Remote side refused the page.
    #[error("Page rejected: {0}")]
    Rejected(String),
}

/// Creates or updates remote pages.
pub trait Publisher: Send + Sync {
    /// Publish a page, returning its remote id.
    ///
    /// Updates must keep `draft.page_id`; creates assign a new id.
    fn publish(&self, draft: &PageDraft<'_>) -> Result<String, PublishError>;
}

/// Page metadata written next to the staged body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageMeta<'a> {
    title: &'a str,
    parent_id: &'a str,
    identity: &'a str,
}

/// Publisher that stages pages in a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryPublisher {
    out_dir: PathBuf,
}

impl DirectoryPublisher {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Staging directory.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl Publisher for DirectoryPublisher {
    fn publish(&self, draft: &PageDraft<'_>) -> Result<String, PublishError> {
        let id = draft
            .page_id
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);
        let page_dir = self.out_dir.join(&id);
        create_dir(&page_dir)?;

        write_file(&page_dir.join("page.xml"), draft.body.as_bytes())?;
        let meta = PageMeta {
            title: draft.title,
            parent_id: draft.parent_id,
            identity: draft.identity,
        };
        write_file(&page_dir.join("page.json"), &serde_json::to_vec_pretty(&meta)?)?;

        if !draft.attachments.is_empty() {
            let attachments_dir = page_dir.join("attachments");
            create_dir(&attachments_dir)?;
            for file in draft.attachments {
                let Some(name) = file.file_name() else {
                    continue;
                };
                fs::copy(file, attachments_dir.join(name)).map_err(|source| PublishError::Io {
                    path: file.clone(),
                    source,
                })?;
            }
        }

        tracing::info!(
            "staged {} as page {id} ({} attachments)",
            draft.identity,
            draft.attachments.len()
        );
        Ok(id)
    }
}

fn create_dir(path: &Path) -> Result<(), PublishError> {
    fs::create_dir_all(path).map_err(|source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), PublishError> {
    fs::write(path, data).map_err(|source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    })
}
