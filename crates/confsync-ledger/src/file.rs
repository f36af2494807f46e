//! State file reading and writing.
//!
//! The state file is a JSON object mapping document identity to
//! [`LedgerEntry`], indented with four spaces and sorted by key:
//!
//! ```text
//! {
//!     "guide/index.md": {
//!         "id": "123456",
//!         "hash": "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d",
//!         "parentId": "98765"
//!     }
//! }
//! ```
//!
//! Writes go to a temporary file in the same directory which then replaces
//! the state file, so an interrupted write leaves the previous state intact.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::LedgerError;
use crate::entry::LedgerEntry;

/// Read entries from a state file.
///
/// Never fails: a missing, unreadable or malformed file yields no entries.
pub(crate) fn read_entries(path: &Path) -> BTreeMap<String, LedgerEntry> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("no state file at {}, starting empty", path.display());
            return BTreeMap::new();
        }
        Err(e) => {
            tracing::warn!("failed to read state file {}: {e}", path.display());
            return BTreeMap::new();
        }
    };

    match serde_json::from_slice(&data) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("ignoring malformed state file {}: {e}", path.display());
            BTreeMap::new()
        }
    }
}

/// Serialize entries as four-space indented JSON.
pub(crate) fn encode_entries(
    entries: &BTreeMap<String, LedgerEntry>,
) -> Result<Vec<u8>, LedgerError> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    entries.serialize(&mut serializer)?;
    Ok(buf)
}

/// Atomically replace the state file with `data`.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<(), LedgerError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_error = |source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(io_error)?;
    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(data).map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
