//! Change-detection ledger.
//!
//! The [`Ledger`] records, per document identity, the remote page id, the
//! fingerprint of the last published body and the parent page id. It decides
//! whether a rendered document needs publishing and remembers page ids for
//! updates.
//!
//! # Lifecycle
//!
//! 1. [`Ledger::load`] once at start. A missing or malformed state file is
//!    not an error; the ledger simply starts empty.
//! 2. [`Ledger::entry_for`] per document, from any number of threads. Hold
//!    the entry lock across decide, publish and commit so two workers never
//!    interleave on one identity.
//! 3. [`Ledger::persist`] once at the end of a successful run.
//!
//! # Example
//!
//! ```
//! use confsync_ledger::Ledger;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let ledger = Ledger::load(dir.path().join("state.json"));
//!
//! let handle = ledger.entry_for("guide/index.md");
//! let mut entry = handle.lock();
//! let check = entry.has_changed(b"<p>Hello</p>");
//! assert!(check.changed);
//! entry.commit("1001", check.hash, "");
//! drop(entry);
//!
//! ledger.persist().unwrap();
//! let reloaded = Ledger::load(dir.path().join("state.json"));
//! assert_eq!(reloaded.snapshot(), ledger.snapshot());
//! ```

mod entry;
mod error;
mod file;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use entry::{ChangeCheck, LedgerEntry, content_hash};
pub use error::LedgerError;

/// Shared handle to one ledger entry.
#[derive(Debug, Clone, Default)]
pub struct EntryHandle(Arc<Mutex<LedgerEntry>>);

impl EntryHandle {
    fn new(entry: LedgerEntry) -> Self {
        Self(Arc::new(Mutex::new(entry)))
    }

    /// Lock the entry for reading or updating.
    pub fn lock(&self) -> MutexGuard<'_, LedgerEntry> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Persistent map of document identity to [`LedgerEntry`].
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, EntryHandle>>,
}

impl Ledger {
    /// Load the ledger stored at `path`.
    ///
    /// Read and parse failures are logged and yield an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries: BTreeMap<_, _> = file::read_entries(&path)
            .into_iter()
            .map(|(identity, entry)| (identity, EntryHandle::new(entry)))
            .collect();
        tracing::debug!("loaded {} ledger entries from {}", entries.len(), path.display());
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry for `identity`, created zero-valued if absent.
    ///
    /// An empty identity means "no document" (the parent of a top-level
    /// page): it gets a fresh zero-valued handle that is never stored.
    pub fn entry_for(&self, identity: &str) -> EntryHandle {
        if identity.is_empty() {
            return EntryHandle::default();
        }
        self.lock_entries()
            .entry(identity.to_owned())
            .or_default()
            .clone()
    }

    /// Copy of every entry, sorted by identity.
    pub fn snapshot(&self) -> BTreeMap<String, LedgerEntry> {
        // Entry locks are taken after the map lock is released
        let handles: Vec<(String, EntryHandle)> = self
            .lock_entries()
            .iter()
            .map(|(identity, handle)| (identity.clone(), handle.clone()))
            .collect();
        handles
            .into_iter()
            .map(|(identity, handle)| {
                let entry = handle.lock().clone();
                (identity, entry)
            })
            .collect()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// Whether no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    /// Write the ledger to its state file.
    ///
    /// The file is replaced atomically; on failure the previous state file
    /// is left untouched.
    pub fn persist(&self) -> Result<(), LedgerError> {
        let snapshot = self.snapshot();
        let data = file::encode_entries(&snapshot)?;
        file::write_atomic(&self.path, &data)?;
        tracing::info!(
            "saved {} ledger entries to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    fn lock_entries(&self) -> MutexGuard<'_, BTreeMap<String, EntryHandle>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let ledger = Ledger::load(tmp.path().join("missing.json"));
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn test_entry_for_creates_zero_entry() {
        let tmp = TempDir::new().unwrap();
        let ledger = Ledger::load(tmp.path().join("state.json"));

        let handle = ledger.entry_for("a.md");
        assert_eq!(*handle.lock(), LedgerEntry::default());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_entry_for_returns_same_entry() {
        let tmp = TempDir::new().unwrap();
        let ledger = Ledger::load(tmp.path().join("state.json"));

        ledger.entry_for("a.md").lock().commit("1", "h", "");
        assert_eq!(ledger.entry_for("a.md").lock().id, "1");
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_empty_identity_is_never_stored() {
        let tmp = TempDir::new().unwrap();
        let ledger = Ledger::load(tmp.path().join("state.json"));

        ledger.entry_for("").lock().commit("1", "h", "");
        assert!(ledger.is_empty());
        assert!(ledger.entry_for("").lock().is_new());
    }

    #[test]
    fn test_persist_then_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".confsync/state.json");
        let ledger = Ledger::load(&path);

        let check = ledger.entry_for("index.md").lock().has_changed(b"root");
        ledger.entry_for("index.md").lock().commit("100", &check.hash, "");
        ledger.entry_for("guide/index.md").lock().commit("101", "abc", "100");
        ledger.persist().unwrap();

        let reloaded = Ledger::load(&path);
        assert_eq!(reloaded.snapshot(), ledger.snapshot());
        assert!(!reloaded.entry_for("index.md").lock().has_changed(b"root").changed);
    }

    #[test]
    fn test_persist_writes_untouched_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(
            &path,
            r#"{"old.md": {"id": "9", "hash": "h", "parentId": "1"}}"#,
        )
        .unwrap();

        let ledger = Ledger::load(&path);
        ledger.entry_for("new.md");
        ledger.persist().unwrap();

        let snapshot = Ledger::load(&path).snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["old.md"].id, "9");
        assert!(snapshot["new.md"].is_new());
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, "garbage").unwrap();

        assert!(Ledger::load(&path).is_empty());
    }

    #[test]
    fn test_concurrent_entry_for() {
        let tmp = TempDir::new().unwrap();
        let ledger = Ledger::load(tmp.path().join("state.json"));

        thread::scope(|scope| {
            for i in 0..8 {
                let ledger = &ledger;
                scope.spawn(move || {
                    let handle = ledger.entry_for("shared.md");
                    let mut entry = handle.lock();
                    let hash = format!("{}{i}", entry.hash);
                    entry.commit("1", hash, "");
                });
            }
        });

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entry_for("shared.md").lock().hash.len(), 8);
    }
}
