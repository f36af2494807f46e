//! Error types for syncing.

use std::path::PathBuf;

use confsync_ledger::LedgerError;
use confsync_renderer::RenderError;

use crate::publisher::PublishError;

/// Error that can occur while syncing documents.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Parent page has not been published yet.
    #[error("Parent page {0} has no page id")]
    MissingParent(String),

    #[error("Failed to save sync state: {0}")]
    Ledger(#[from] LedgerError),
}
