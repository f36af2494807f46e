//! `confsync render` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use confsync_renderer::PageContext;

use super::{GlobalArgs, build_renderer};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Path to the markdown file.
    markdown_file: PathBuf,

    /// Title of the page owning same-directory attachments.
    #[arg(long, default_value = "")]
    parent_title: String,

    /// Render as an index document (default: file name equals the index name).
    #[arg(long)]
    index: bool,
}

impl RenderArgs {
    /// Execute the render command.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let config = global.load_config()?;
        let renderer = build_renderer(&config);

        let is_index = self.index
            || self
                .markdown_file
                .file_name()
                .is_some_and(|name| name == config.docs_resolved.index_name.as_str());
        let context = PageContext::new(self.parent_title, is_index);
        let page = renderer.render_file(&self.markdown_file, &context)?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(page.body.as_bytes())?;
        stdout.write_all(b"\n")?;

        if !page.attachments.is_empty() {
            let output = Output::new();
            output.highlight(&format!("\nAttachments ({}):", page.attachments.len()));
            for attachment in &page.attachments {
                output.info(&format!("  {} ({})", attachment.path, attachment.dir.as_str()));
            }
        }
        Ok(())
    }
}
