//! `confsync status` command implementation.

use clap::Args;
use confsync_sync::{DirectoryPublisher, SyncReport};

use super::{GlobalArgs, build_runner, scan_documents};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the status command.
#[derive(Args)]
pub(crate) struct StatusArgs {
    /// Also list unchanged documents.
    #[arg(short, long)]
    all: bool,
}

impl StatusArgs {
    /// Execute the status command. Never publishes or writes state.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;

        let documents = scan_documents(&config)?;
        let (runner, ledger) = build_runner(&config, true);
        let publisher = DirectoryPublisher::new(config.publish_resolved.out_dir.clone());
        let report = runner.run(&documents, &ledger, &publisher);

        print_status(&output, &report, self.all);
        if report.has_failures() {
            return Err(CliError::Failed(report.failed()));
        }
        Ok(())
    }
}

fn print_status(output: &Output, report: &SyncReport, all: bool) {
    let listed: Vec<_> = if all {
        report.results.iter().collect()
    } else {
        report.pending().collect()
    };

    if listed.is_empty() {
        output.info("Everything up to date.");
    }
    for result in listed {
        output.document(result);
    }
    output.summary(report);
}
