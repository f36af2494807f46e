//! CLI error types.

use confsync_config::ConfigError;
use confsync_renderer::RenderError;
use confsync_sync::SyncError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    Sync(#[from] SyncError),

    #[error("{0} document(s) failed to sync")]
    Failed(usize),
}
