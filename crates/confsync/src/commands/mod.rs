//! CLI command implementations.

pub(crate) mod render;
pub(crate) mod status;
pub(crate) mod sync;

use std::path::PathBuf;

use clap::Args;
use confsync_config::{CliSettings, Config};
use confsync_ledger::Ledger;
use confsync_renderer::StorageRenderer;
use confsync_sync::{Scanner, SourceDocument, SyncRunner};

pub(crate) use render::RenderArgs;
pub(crate) use status::StatusArgs;
pub(crate) use sync::SyncArgs;

use crate::error::CliError;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover confsync.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(long, global = true)]
    source_dir: Option<PathBuf>,

    /// Sync state file (overrides config).
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Staging directory for published pages (overrides config).
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Render soft line breaks as line breaks.
    #[arg(long, global = true)]
    hard_line_break: bool,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,
}

impl GlobalArgs {
    /// Load config with CLI overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir.clone(),
            state_file: self.state_file.clone(),
            out_dir: self.out_dir.clone(),
            hard_line_break: self.hard_line_break.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        config.validate()?;
        match &config.config_path {
            Some(path) => tracing::info!("using config {}", path.display()),
            None => tracing::info!("no confsync.toml found, using defaults"),
        }
        Ok(config)
    }
}

/// Storage renderer configured from `config`.
pub(crate) fn build_renderer(config: &Config) -> StorageRenderer {
    StorageRenderer::new()
        .with_attachments_dir(config.docs_resolved.attachments_dir.clone())
        .with_hard_line_break(config.render.hard_line_break)
        .with_diagram_language(config.render.diagram_language.clone())
        .with_tip_title(config.render.tip_title.clone())
}

/// Scan the configured source directory.
pub(crate) fn scan_documents(config: &Config) -> Result<Vec<SourceDocument>, CliError> {
    let docs = &config.docs_resolved;
    let documents = Scanner::new(docs.source_dir.clone())
        .with_attachments_dir(docs.attachments_dir.clone())
        .with_index_name(docs.index_name.clone())
        .with_root_title(docs.root_title())
        .scan()?;
    Ok(documents)
}

/// Sync runner and ledger for `config`.
pub(crate) fn build_runner(config: &Config, dry_run: bool) -> (SyncRunner, Ledger) {
    let runner = SyncRunner::new(build_renderer(config))
        .with_root_page_id(config.publish_resolved.root_page_id.clone())
        .with_dry_run(dry_run);
    let ledger = Ledger::load(config.state_resolved.file.clone());
    (runner, ledger)
}
