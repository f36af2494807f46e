//! Markdown to Confluence storage format rendering.
//!
//! [`StorageRenderer`] turns a markdown document into the XHTML-based storage
//! format Confluence pages are stored in:
//!
//! - Relative images and links become attachment macros bound to the page
//!   that owns the file (see [`AttachmentClassifier`])
//! - Code blocks become `code` macros, except the diagram language
//! - Block quotes become `tip` macros
//! - A table of contents macro heads every page
//!
//! Everything else is plain XHTML produced by [`XhtmlRenderer`].
//!
//! # Example
//!
//! ```
//! use confsync_renderer::{PageContext, StorageRenderer};
//!
//! let renderer = StorageRenderer::new().with_hard_line_break(true);
//! let page = renderer.render_markdown("```rust\nfn main() {}\n```", &PageContext::default());
//! assert!(page.body.contains(r#"<ac:parameter ac:name="language">rust</ac:parameter>"#));
//! ```

mod attachment;
mod error;
mod macros;
mod node;
mod storage;
mod xhtml;

pub use attachment::{AttachmentClassifier, AttachmentDir, AttachmentRef, DEFAULT_ATTACHMENTS_DIR};
pub use error::RenderError;
pub use macros::TOC_MACRO;
pub use storage::{
    DEFAULT_DIAGRAM_LANGUAGE, DEFAULT_TIP_TITLE, PageContext, RenderedPage, StorageRenderer,
};
pub use xhtml::{XhtmlRenderer, escape_xml};
