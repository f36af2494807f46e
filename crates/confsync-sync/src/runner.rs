//! Level-by-level sync of source documents.
//!
//! Documents are processed in hierarchy order so a parent page always has an
//! id before its children need it. Documents within one level are independent
//! and run in parallel on the global rayon thread pool.

use rayon::prelude::*;

use confsync_ledger::Ledger;
use confsync_renderer::{AttachmentDir, RenderedPage, StorageRenderer};

use crate::document::{DocumentSource, SourceDocument};
use crate::error::SyncError;
use crate::publisher::{PageDraft, Publisher};

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Body and parent match the ledger.
    Unchanged,
    /// Dry run: would be created.
    WouldCreate,
    /// Dry run: would be updated.
    WouldUpdate,
    /// Published as a new page.
    Created,
    /// Republished under its existing page id.
    Updated,
    /// Document failed; its ledger entry is untouched.
    Failed(String),
}

impl Outcome {
    /// Short label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::WouldCreate => "new",
            Self::WouldUpdate => "changed",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Failed(_) => "failed",
        }
    }
}

/// Outcome for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResult {
    pub identity: String,
    pub title: String,
    pub outcome: Outcome,
}

/// Result of a sync run, in hierarchy order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub results: Vec<DocumentResult>,
}

impl SyncReport {
    /// Number of documents with an outcome matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| *o == Outcome::Unchanged)
    }

    /// Documents created, or that would be on a dry run.
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created | Outcome::WouldCreate))
    }

    /// Documents updated, or that would be on a dry run.
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Updated | Outcome::WouldUpdate))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Results other than [`Outcome::Unchanged`].
    pub fn pending(&self) -> impl Iterator<Item = &DocumentResult> {
        self.results
            .iter()
            .filter(|r| r.outcome != Outcome::Unchanged)
    }
}

/// Renders documents, detects changes and publishes what changed.
#[derive(Debug, Clone)]
pub struct SyncRunner {
    renderer: StorageRenderer,
    root_page_id: String,
    dry_run: bool,
}

impl SyncRunner {
    pub fn new(renderer: StorageRenderer) -> Self {
        Self {
            renderer,
            root_page_id: String::new(),
            dry_run: false,
        }
    }

    /// Parent id for top-level documents.
    #[must_use]
    pub fn with_root_page_id(mut self, id: impl Into<String>) -> Self {
        self.root_page_id = id.into();
        self
    }

    /// Decide without publishing or touching the ledger.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Sync `documents`, one level at a time.
    ///
    /// Per-document failures are reported, not returned; the run continues.
    pub fn run(
        &self,
        documents: &[SourceDocument],
        ledger: &Ledger,
        publisher: &dyn Publisher,
    ) -> SyncReport {
        let mut ordered: Vec<&SourceDocument> = documents.iter().collect();
        ordered.sort_by(|a, b| {
            a.level
                .cmp(&b.level)
                .then_with(|| a.identity.cmp(&b.identity))
        });

        let mut results = Vec::with_capacity(ordered.len());
        for level in ordered.chunk_by(|a, b| a.level == b.level) {
            let level_results: Vec<DocumentResult> = level
                .par_iter()
                .map(|doc| self.sync_one(doc, ledger, publisher))
                .collect();
            results.extend(level_results);
        }

        let report = SyncReport { results };
        tracing::info!(
            "sync finished: {} created, {} updated, {} unchanged, {} failed",
            report.created(),
            report.updated(),
            report.unchanged(),
            report.failed()
        );
        report
    }

    /// Persist the ledger after a run. Does nothing on a dry run.
    pub fn persist_ledger(&self, ledger: &Ledger) -> Result<(), SyncError> {
        if self.dry_run {
            tracing::debug!("dry run, not saving sync state");
            return Ok(());
        }
        ledger.persist()?;
        Ok(())
    }

    fn sync_one(
        &self,
        doc: &SourceDocument,
        ledger: &Ledger,
        publisher: &dyn Publisher,
    ) -> DocumentResult {
        let outcome = self
            .sync_document(doc, ledger, publisher)
            .unwrap_or_else(|e| {
                tracing::warn!("failed to sync {}: {e}", doc.identity);
                Outcome::Failed(e.to_string())
            });
        tracing::debug!("{}: {}", doc.identity, outcome.label());
        DocumentResult {
            identity: doc.identity.clone(),
            title: doc.title.clone(),
            outcome,
        }
    }

    fn sync_document(
        &self,
        doc: &SourceDocument,
        ledger: &Ledger,
        publisher: &dyn Publisher,
    ) -> Result<Outcome, SyncError> {
        let page = self.render(doc)?;
        let parent_id = self.parent_id(doc, ledger)?;

        // Held until commit so no other worker decides on this identity
        let handle = ledger.entry_for(&doc.identity);
        let mut entry = handle.lock();

        let check = entry.has_changed(page.body.as_bytes());
        let is_new = entry.is_new();
        if !is_new && !check.changed && entry.parent_id == parent_id {
            return Ok(Outcome::Unchanged);
        }
        if self.dry_run {
            return Ok(if is_new {
                Outcome::WouldCreate
            } else {
                Outcome::WouldUpdate
            });
        }

        let draft = PageDraft {
            identity: &doc.identity,
            title: &doc.title,
            parent_id: &parent_id,
            page_id: (!is_new).then_some(entry.id.as_str()),
            body: &page.body,
            attachments: &doc.attachments,
        };
        let id = publisher.publish(&draft)?;
        entry.commit(id, check.hash, parent_id);

        Ok(if is_new {
            Outcome::Created
        } else {
            Outcome::Updated
        })
    }

    fn render(&self, doc: &SourceDocument) -> Result<RenderedPage, SyncError> {
        let context = doc.context();
        let page = match &doc.source {
            DocumentSource::File(path) => self.renderer.render_file(path, &context)?,
            DocumentSource::Virtual => self.renderer.render_markdown("", &context),
        };
        warn_missing_attachments(doc, &page);
        Ok(page)
    }

    /// Remote id of the document's parent page.
    fn parent_id(&self, doc: &SourceDocument, ledger: &Ledger) -> Result<String, SyncError> {
        if doc.parent_identity.is_empty() {
            return Ok(self.root_page_id.clone());
        }
        let id = ledger.entry_for(&doc.parent_identity).lock().id.clone();
        if id.is_empty() && !self.dry_run {
            return Err(SyncError::MissingParent(doc.parent_identity.clone()));
        }
        Ok(id)
    }
}

/// Log same-directory attachments that do not exist on disk.
fn warn_missing_attachments(doc: &SourceDocument, page: &RenderedPage) {
    let Some(dir) = doc.path().and_then(|path| path.parent()) else {
        return;
    };
    for reference in &page.attachments {
        if reference.dir == AttachmentDir::Current && !dir.join(&reference.path).exists() {
            tracing::warn!(
                "{} references missing attachment {}",
                doc.identity,
                reference.path
            );
        }
    }
}
