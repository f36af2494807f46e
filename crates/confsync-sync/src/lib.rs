//! Document discovery, change detection and publishing.
//!
//! A sync run has three steps:
//!
//! 1. [`Scanner`] walks the source directory into [`SourceDocument`]s, one
//!    per page, in hierarchy order
//! 2. [`SyncRunner`] renders each document and asks the
//!    [`Ledger`](confsync_ledger::Ledger) whether it changed
//! 3. Changed documents go to a [`Publisher`]; the returned page ids are
//!    committed to the ledger, which is persisted once at the end
//!
//! # Example
//!
//! ```no_run
//! use confsync_ledger::Ledger;
//! use confsync_renderer::StorageRenderer;
//! use confsync_sync::{DirectoryPublisher, Scanner, SyncRunner};
//!
//! # fn main() -> Result<(), confsync_sync::SyncError> {
//! let documents = Scanner::new("docs").scan()?;
//! let ledger = Ledger::load(".confsync/state.json");
//! let runner = SyncRunner::new(StorageRenderer::new());
//! let report = runner.run(&documents, &ledger, &DirectoryPublisher::new(".confsync/pages"));
//! runner.persist_ledger(&ledger)?;
//! println!("{} pages created", report.created());
//! # Ok(())
//! # }
//! ```

mod document;
mod error;
mod publisher;
mod runner;
mod scanner;

pub use document::{DocumentSource, SourceDocument};
pub use error::SyncError;
pub use publisher::{DirectoryPublisher, PageDraft, PublishError, Publisher};
pub use runner::{DocumentResult, Outcome, SyncReport, SyncRunner};
pub use scanner::{DEFAULT_INDEX_NAME, Scanner};
