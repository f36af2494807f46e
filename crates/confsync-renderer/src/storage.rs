//! Confluence storage-format renderer.
//!
//! Rewrites the nodes Confluence represents with macros (attachment images
//! and links, code blocks, block quotes) and delegates everything else to
//! [`XhtmlRenderer`].

use std::fs;
use std::path::Path;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::attachment::{AttachmentClassifier, AttachmentDir, AttachmentRef};
use crate::error::RenderError;
use crate::macros::{self, AttachmentMacro, TOC_MACRO};
use crate::node::{Node, NodeKind};
use crate::xhtml::XhtmlRenderer;

/// Default language of code blocks left to the XHTML renderer.
pub const DEFAULT_DIAGRAM_LANGUAGE: &str = "mermaid";

/// Default title of the tip macro block quotes become.
pub const DEFAULT_TIP_TITLE: &str = "提示";

/// Where a document sits in the page tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    /// Title of the page that owns same-directory attachments of a
    /// non-index document.
    pub parent_title: String,
    /// Whether the document is its directory's index document.
    pub is_index: bool,
}

impl PageContext {
    /// Create a page context.
    #[must_use]
    pub fn new(parent_title: impl Into<String>, is_index: bool) -> Self {
        Self {
            parent_title: parent_title.into(),
            is_index,
        }
    }
}

/// Result of rendering one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    /// Storage-format body, TOC macro included.
    pub body: String,
    /// Attachments referenced by the body, in document order.
    pub attachments: Vec<AttachmentRef>,
}

/// Markdown to Confluence storage-format renderer.
///
/// # Example
///
/// ```
/// use confsync_renderer::{PageContext, StorageRenderer};
///
/// let renderer = StorageRenderer::new();
/// let page = renderer.render_markdown("![Shot](assets/shot.png)", &PageContext::new("Guide", true));
/// assert!(page.body.contains(r#"<ri:attachment ri:filename="shot.png">"#));
/// assert_eq!(page.attachments.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct StorageRenderer {
    classifier: AttachmentClassifier,
    hard_line_break: bool,
    diagram_language: String,
    tip_title: String,
}

impl Default for StorageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageRenderer {
    /// Create a renderer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            classifier: AttachmentClassifier::default(),
            hard_line_break: false,
            diagram_language: DEFAULT_DIAGRAM_LANGUAGE.to_owned(),
            tip_title: DEFAULT_TIP_TITLE.to_owned(),
        }
    }

    /// Set the attachments folder name.
    #[must_use]
    pub fn with_attachments_dir(mut self, name: impl Into<String>) -> Self {
        self.classifier = AttachmentClassifier::new(name);
        self
    }

    /// Render soft line breaks as `<br />`.
    #[must_use]
    pub fn with_hard_line_break(mut self, enabled: bool) -> Self {
        self.hard_line_break = enabled;
        self
    }

    /// Set the code block language left to the XHTML renderer.
    #[must_use]
    pub fn with_diagram_language(mut self, language: impl Into<String>) -> Self {
        self.diagram_language = language.into();
        self
    }

    /// Set the tip macro title.
    #[must_use]
    pub fn with_tip_title(mut self, title: impl Into<String>) -> Self {
        self.tip_title = title.into();
        self
    }

    /// Attachment classifier in use.
    #[must_use]
    pub fn classifier(&self) -> &AttachmentClassifier {
        &self.classifier
    }

    /// Markdown extensions enabled for parsing.
    #[must_use]
    pub fn parser_options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
    }

    /// Read and render a markdown file.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if the file cannot be read or is not UTF-8.
    pub fn render_file(
        &self,
        path: &Path,
        context: &PageContext,
    ) -> Result<RenderedPage, RenderError> {
        let markdown = fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.render_markdown(&markdown, context))
    }

    /// Render markdown text.
    #[must_use]
    pub fn render_markdown(&self, markdown: &str, context: &PageContext) -> RenderedPage {
        let mut writer = StorageWriter::new(self, context);
        for event in Parser::new_ext(markdown, Self::parser_options()) {
            writer.event(event);
        }
        writer.finish()
    }
}

/// Image or link node currently open.
#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Rewritten as an attachment macro.
    Attachment(AttachmentMacro),
    /// Passed through to the XHTML renderer.
    Delegated { image: bool },
    /// Nested in an attachment; emits no tags.
    Suppressed,
}

#[derive(Debug)]
struct PendingCode {
    language: String,
    content: String,
}

/// Per-render state.
struct StorageWriter<'r> {
    renderer: &'r StorageRenderer,
    context: &'r PageContext,
    html: XhtmlRenderer,
    frames: Vec<Frame>,
    code: Option<PendingCode>,
    attachments: Vec<AttachmentRef>,
}

impl<'r> StorageWriter<'r> {
    fn new(renderer: &'r StorageRenderer, context: &'r PageContext) -> Self {
        let mut html = XhtmlRenderer::new().with_hard_line_break(renderer.hard_line_break);
        html.output_mut().push_str(TOC_MACRO);
        Self {
            renderer,
            context,
            html,
            frames: Vec::new(),
            code: None,
            attachments: Vec::new(),
        }
    }

    fn finish(self) -> RenderedPage {
        RenderedPage {
            body: self.html.into_output(),
            attachments: self.attachments,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        if let Some(code) = &mut self.code {
            match event {
                Event::Text(text) => code.content.push_str(&text),
                Event::End(TagEnd::CodeBlock) => self.finish_code(),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.enter(tag),
            Event::End(tag) => self.leave(tag),
            event => self.leaf(event),
        }
    }

    fn enter(&mut self, tag: Tag<'_>) {
        let delegate = match Node::entering(&tag) {
            Node::Image { dest } => self.enter_reference(AttachmentMacro::Image, Some(dest)),
            Node::Link { dest, email } => {
                self.enter_reference(AttachmentMacro::Link, (!email).then_some(dest))
            }
            Node::CodeBlock { language } => self.enter_code_block(language),
            Node::BlockQuote => {
                macros::tip_start(&self.renderer.tip_title, self.html.output_mut());
                false
            }
            Node::Other => self.attachment_body().is_none(),
        };
        if delegate {
            self.html.event(Event::Start(tag));
        }
    }

    fn leave(&mut self, tag: TagEnd) {
        match NodeKind::leaving(tag) {
            NodeKind::Image | NodeKind::Link => match self.frames.pop() {
                Some(Frame::Attachment(kind)) => {
                    macros::attachment_end(kind, self.html.output_mut());
                }
                Some(Frame::Suppressed) => {}
                Some(Frame::Delegated { .. }) | None => self.html.event(Event::End(tag)),
            },
            NodeKind::BlockQuote => macros::tip_end(self.html.output_mut()),
            NodeKind::CodeBlock => self.html.event(Event::End(tag)),
            NodeKind::Other => {
                if self.attachment_body().is_none() {
                    self.html.event(Event::End(tag));
                }
            }
        }
    }

    fn leaf(&mut self, event: Event<'_>) {
        match self.attachment_body() {
            Some(AttachmentMacro::Link) => match event {
                Event::Text(text) | Event::Code(text) | Event::InlineHtml(text) => {
                    macros::push_cdata(&text, self.html.output_mut());
                }
                Event::SoftBreak | Event::HardBreak => self.html.output_mut().push('\n'),
                _ => {}
            },
            // Alt text is dropped
            Some(AttachmentMacro::Image) => {}
            None => self.html.event(event),
        }
    }

    /// Open an image or link. Returns whether the XHTML renderer handles it.
    ///
    /// `dest` is `None` for references that are never attachments.
    fn enter_reference(&mut self, kind: AttachmentMacro, dest: Option<&str>) -> bool {
        let frame = if self.attachment_body().is_some() {
            Frame::Suppressed
        } else {
            // Inside alt text the XHTML renderer tracks image nesting itself
            let reference = if self.in_delegated_image() {
                None
            } else {
                dest.and_then(|dest| self.renderer.classifier.reference(dest))
            };
            match reference {
                Some(reference) => {
                    let page_title = match &reference.dir {
                        AttachmentDir::Current if self.context.is_index => None,
                        AttachmentDir::Current => Some(self.context.parent_title.as_str()),
                        dir @ AttachmentDir::Page(_) => dir.page_title(),
                    };
                    macros::attachment_start(
                        kind,
                        &reference.filename,
                        page_title,
                        self.html.output_mut(),
                    );
                    self.attachments.push(reference);
                    Frame::Attachment(kind)
                }
                None => Frame::Delegated {
                    image: kind == AttachmentMacro::Image,
                },
            }
        };

        let delegate = matches!(frame, Frame::Delegated { .. });
        self.frames.push(frame);
        delegate
    }

    /// Start a code block. Returns whether the XHTML renderer handles it.
    fn enter_code_block(&mut self, language: &str) -> bool {
        if language == self.renderer.diagram_language {
            return true;
        }
        self.code = Some(PendingCode {
            language: language.to_owned(),
            content: String::new(),
        });
        false
    }

    fn finish_code(&mut self) {
        if let Some(code) = self.code.take() {
            macros::code_macro(&code.language, &code.content, self.html.output_mut());
        }
    }

    /// Kind of the attachment whose body is being rendered, if any.
    fn attachment_body(&self) -> Option<AttachmentMacro> {
        self.frames.iter().find_map(|frame| match frame {
            Frame::Attachment(kind) => Some(*kind),
            _ => None,
        })
    }

    fn in_delegated_image(&self) -> bool {
        self.frames
            .iter()
            .any(|frame| matches!(frame, Frame::Delegated { image: true }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn index() -> PageContext {
        PageContext::new("Docs", true)
    }

    fn child() -> PageContext {
        PageContext::new("Guide", false)
    }

    fn render(markdown: &str, context: &PageContext) -> String {
        let body = StorageRenderer::new().render_markdown(markdown, context).body;
        body.strip_prefix(TOC_MACRO)
            .expect("body starts with TOC macro")
            .to_owned()
    }

    fn xhtml(markdown: &str) -> String {
        XhtmlRenderer::new().render(Parser::new_ext(markdown, StorageRenderer::parser_options()))
    }

    #[test]
    fn test_toc_macro_is_prepended() {
        let page = StorageRenderer::new().render_markdown("", &index());
        assert_eq!(
            page.body,
            "\n<ac:structured-macro ac:name=\"toc\">\n\t<ac:parameter ac:name=\"outline\">true</ac:parameter>\n</ac:structured-macro>\n"
        );
        assert!(page.attachments.is_empty());
    }

    #[test]
    fn test_image_in_other_directory_references_that_page() {
        assert_eq!(
            render("![Photo](img/photo.png)", &index()),
            concat!(
                r#"<p><ac:image><ri:attachment ri:filename="photo.png">"#,
                r#"<ri:page ri:content-title="img"/></ri:attachment></ac:image></p>"#
            )
        );
    }

    #[test]
    fn test_image_in_attachments_folder_on_index_has_no_page() {
        assert_eq!(
            render("![Diagram](assets/diagram.png)", &index()),
            r#"<p><ac:image><ri:attachment ri:filename="diagram.png"></ri:attachment></ac:image></p>"#
        );
    }

    #[test]
    fn test_same_directory_attachment_on_child_references_parent() {
        assert_eq!(
            render("![Diagram](diagram.png)", &child()),
            concat!(
                r#"<p><ac:image><ri:attachment ri:filename="diagram.png">"#,
                r#"<ri:page ri:content-title="Guide"/></ri:attachment></ac:image></p>"#
            )
        );
    }

    #[test]
    fn test_attachment_link_body_is_plain_text() {
        assert_eq!(
            render("[the *manual*](manual.pdf)", &child()),
            concat!(
                r#"<p><ac:link><ri:attachment ri:filename="manual.pdf">"#,
                r#"<ri:page ri:content-title="Guide"/></ri:attachment>"#,
                "<ac:plain-text-link-body><![CDATA[the manual]]></ac:plain-text-link-body>",
                "</ac:link></p>"
            )
        );
    }

    #[test]
    fn test_link_body_cdata_terminator_is_split() {
        let body = render("[`]]>` & more](notes.txt)", &index());
        assert!(body.contains("<![CDATA[]]]]><![CDATA[> & more]]>"));
    }

    #[test]
    fn test_image_inside_attachment_link_emits_no_tags() {
        let body = render("[![icon](icon.png) download](setup.zip)", &index());
        assert_eq!(
            body,
            concat!(
                r#"<p><ac:link><ri:attachment ri:filename="setup.zip"></ri:attachment>"#,
                "<ac:plain-text-link-body><![CDATA[icon download]]></ac:plain-text-link-body>",
                "</ac:link></p>"
            )
        );
    }

    #[test]
    fn test_attachment_image_alt_text_is_dropped() {
        let body = render("![Architecture overview](arch.png)", &index());
        assert!(!body.contains("Architecture"));
    }

    #[test]
    fn test_attachment_image_inside_external_link() {
        assert_eq!(
            render("[![build](badge.svg)](https://ci.example.com)", &index()),
            concat!(
                r#"<p><a href="https://ci.example.com">"#,
                r#"<ac:image><ri:attachment ri:filename="badge.svg"></ri:attachment></ac:image>"#,
                "</a></p>"
            )
        );
    }

    #[test]
    fn test_external_references_match_xhtml_output() {
        for markdown in [
            "[Example](https://example.com \"Title\")",
            "![Logo](https://example.com/logo.png)",
            "![Logo](/static/logo.png)",
            "See [below](#usage) and [mail](mailto:team@example.com).",
            "![outer ![inner](in.png)](https://example.com/o.png)",
        ] {
            assert_eq!(render(markdown, &child()), xhtml(markdown), "{markdown}");
        }
    }

    #[test]
    fn test_email_autolink_is_external() {
        let body = render("Mail <team@example.com> now", &child());
        assert_eq!(
            body,
            r#"<p>Mail <a href="mailto:team@example.com">team@example.com</a> now</p>"#
        );
        assert!(!body.contains("ri:attachment"));

        let page = StorageRenderer::new().render_markdown("<team@example.com>", &index());
        assert!(page.attachments.is_empty());
    }

    #[test]
    fn test_other_nodes_match_xhtml_output() {
        let markdown = "# Title\n\nSome *text* with `code`.\n\n- [x] done\n- [ ] todo\n\n| A |\n|---|\n| 1 |\n";
        assert_eq!(render(markdown, &child()), xhtml(markdown));
    }

    #[test]
    fn test_code_block_becomes_code_macro() {
        assert_eq!(
            render("```go\nfmt.Println(\"hi\")\n```", &index()),
            concat!(
                r#"<ac:structured-macro ac:name="code">"#,
                r#"<ac:parameter ac:name="linenumbers">true</ac:parameter>"#,
                r#"<ac:parameter ac:name="theme">RDark</ac:parameter>"#,
                r#"<ac:parameter ac:name="language">go</ac:parameter>"#,
                "<ac:plain-text-body><![CDATA[fmt.Println(\"hi\")\n]]></ac:plain-text-body>",
                "</ac:structured-macro>"
            )
        );
    }

    #[test]
    fn test_code_block_language_is_first_word() {
        let body = render("```go title=main.go\npackage main\n```", &index());
        assert!(body.contains(r#"<ac:parameter ac:name="language">go</ac:parameter>"#));
        assert!(!body.contains("title=main.go"));
    }

    #[test]
    fn test_diagram_with_attributes_is_delegated() {
        let markdown = "```mermaid theme=dark\ngraph TD\n```";
        assert_eq!(
            render(markdown, &index()),
            "<pre><code class=\"language-mermaid\">graph TD\n</code></pre>"
        );
    }

    #[test]
    fn test_code_block_without_language() {
        let body = render("```\nplain\n```", &index());
        assert!(body.contains(r#"<ac:parameter ac:name="language"></ac:parameter>"#));
        assert!(body.contains("<![CDATA[plain\n]]>"));

        let indented = render("    x = 1\n", &index());
        assert!(indented.starts_with(r#"<ac:structured-macro ac:name="code">"#));
        assert!(indented.contains(r#"<ac:parameter ac:name="language"></ac:parameter>"#));
        assert!(indented.contains("x = 1"));
    }

    #[test]
    fn test_diagram_code_block_is_delegated() {
        let markdown = "```mermaid\ngraph TD\n```";
        assert_eq!(render(markdown, &index()), xhtml(markdown));
        assert_eq!(
            render(markdown, &index()),
            "<pre><code class=\"language-mermaid\">graph TD\n</code></pre>"
        );
    }

    #[test]
    fn test_custom_diagram_language() {
        let renderer = StorageRenderer::new().with_diagram_language("plantuml");
        let body = renderer
            .render_markdown("```mermaid\ngraph TD\n```", &index())
            .body;
        assert!(body.contains(r#"<ac:parameter ac:name="language">mermaid</ac:parameter>"#));
    }

    #[test]
    fn test_block_quote_becomes_tip_macro() {
        assert_eq!(
            render("> Remember this.", &index()),
            concat!(
                r#"<ac:structured-macro ac:name="tip">"#,
                r#"<ac:parameter ac:name="title">提示</ac:parameter>"#,
                "<ac:rich-text-body><p>Remember this.</p></ac:rich-text-body>",
                "</ac:structured-macro>"
            )
        );
    }

    #[test]
    fn test_custom_tip_title() {
        let body = StorageRenderer::new()
            .with_tip_title("Tip")
            .render_markdown("> x", &index())
            .body;
        assert!(body.contains(r#"<ac:parameter ac:name="title">Tip</ac:parameter>"#));
    }

    #[test]
    fn test_hard_line_break() {
        let renderer = StorageRenderer::new().with_hard_line_break(true);
        let body = renderer.render_markdown("one\ntwo", &index()).body;
        assert!(body.ends_with("<p>one<br />two</p>"));
        assert!(render("one\ntwo", &index()).ends_with("<p>one\ntwo</p>"));
    }

    #[test]
    fn test_custom_attachments_folder() {
        let renderer = StorageRenderer::new().with_attachments_dir("media");
        let body = renderer
            .render_markdown("![a](media/a.png)", &index())
            .body;
        assert!(body.contains(r#"<ri:attachment ri:filename="a.png"></ri:attachment>"#));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let body = render("![x](a&b.png)", &PageContext::new("Q&A", false));
        assert!(body.contains(r#"ri:filename="a&amp;b.png""#));
        assert!(body.contains(r#"ri:content-title="Q&amp;A""#));
    }

    #[test]
    fn test_attachments_are_reported() {
        let page = StorageRenderer::new().render_markdown(
            "![a](assets/a.png) [b](../setup/b.pdf) [c](https://x.io/c.pdf)",
            &index(),
        );
        let paths: Vec<_> = page.attachments.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["assets/a.png", "../setup/b.pdf"]);
        assert_eq!(page.attachments[0].dir, AttachmentDir::Current);
        assert_eq!(
            page.attachments[1].dir,
            AttachmentDir::Page("../setup".to_owned())
        );
    }

    #[test]
    fn test_render_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.md");
        fs::write(&path, "# Hello\n").unwrap();

        let page = StorageRenderer::new().render_file(&path, &index()).unwrap();
        assert!(page.body.ends_with("<h1>Hello</h1>"));
    }

    #[test]
    fn test_render_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.md");

        let err = StorageRenderer::new()
            .render_file(&path, &index())
            .unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
        assert!(err.to_string().contains("missing.md"));
    }
}
