//! `confsync sync` command implementation.

use clap::Args;
use confsync_sync::{DirectoryPublisher, SyncReport};

use super::{GlobalArgs, build_runner, scan_documents};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the sync command.
#[derive(Args)]
pub(crate) struct SyncArgs {
    /// Preview changes without publishing or saving state.
    #[arg(long)]
    dry_run: bool,
}

impl SyncArgs {
    /// Execute the sync command.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;

        let documents = scan_documents(&config)?;
        output.info(&format!(
            "Syncing {} documents from {}...",
            documents.len(),
            config.docs_resolved.source_dir.display()
        ));

        let (runner, ledger) = build_runner(&config, self.dry_run);
        let publisher = DirectoryPublisher::new(config.publish_resolved.out_dir.clone());
        let report = runner.run(&documents, &ledger, &publisher);
        runner.persist_ledger(&ledger)?;

        print_sync_result(&output, &report, self.dry_run);
        if report.has_failures() {
            return Err(CliError::Failed(report.failed()));
        }
        Ok(())
    }
}

fn print_sync_result(output: &Output, report: &SyncReport, dry_run: bool) {
    if dry_run {
        output.highlight("\n[DRY RUN] No changes made.");
    }
    for result in report.pending() {
        output.document(result);
    }
    output.summary(report);
}
