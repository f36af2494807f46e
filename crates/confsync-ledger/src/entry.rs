//! Per-document sync state.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Sync state recorded for one document.
///
/// A zero-valued entry means the document was never synced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Remote page id.
    #[serde(default)]
    pub id: String,
    /// Hex SHA-1 of the last published body.
    #[serde(default)]
    pub hash: String,
    /// Remote id of the parent page at the last publish.
    #[serde(default, rename = "parentId")]
    pub parent_id: String,
}

/// Outcome of comparing content against an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeCheck {
    /// Fingerprint of the compared content.
    pub hash: String,
    /// Whether the fingerprint differs from the recorded one.
    pub changed: bool,
}

impl LedgerEntry {
    /// Whether the document has never been published.
    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }

    /// Fingerprint `content` and compare it with the recorded hash.
    pub fn has_changed(&self, content: &[u8]) -> ChangeCheck {
        let hash = content_hash(content);
        let changed = hash != self.hash;
        ChangeCheck { hash, changed }
    }

    /// Record a successful publish.
    pub fn commit(
        &mut self,
        id: impl Into<String>,
        hash: impl Into<String>,
        parent_id: impl Into<String>,
    ) {
        self.id = id.into();
        self.hash = hash.into();
        self.parent_id = parent_id.into();
    }
}

/// Lowercase hex SHA-1 of `content`.
pub fn content_hash(content: &[u8]) -> String {
    hex::encode(Sha1::digest(content))
}
