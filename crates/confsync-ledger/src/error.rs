//! Error types for the ledger.

use std::path::PathBuf;

/// Error returned when the ledger cannot be persisted.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// State file or its directory could not be written.
    #[error("Failed to write state file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}
