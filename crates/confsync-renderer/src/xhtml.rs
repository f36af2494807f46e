//! Standard XHTML rendering of markdown events.
//!
//! [`XhtmlRenderer`] is the default renderer the storage-format renderer
//! delegates to for every node it does not rewrite. It produces plain
//! XHTML (self-closing void elements) because Confluence storage format is
//! XML.

use std::fmt::Write;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, LinkType, Tag, TagEnd};

/// Renders pulldown-cmark events to XHTML.
#[derive(Debug, Default)]
pub struct XhtmlRenderer {
    output: String,
    hard_line_break: bool,
    table: TableState,
    image: Option<PendingImage>,
    code: Option<PendingCode>,
}

/// Image whose alt text is still being collected.
#[derive(Debug)]
struct PendingImage {
    src: String,
    title: String,
    alt: String,
    /// Images nested inside the alt text.
    depth: usize,
}

/// Code block whose content is still being collected.
#[derive(Debug)]
struct PendingCode {
    lang: Option<String>,
    content: String,
}

#[derive(Debug, Default)]
struct TableState {
    alignments: Vec<Alignment>,
    cell: usize,
    in_head: bool,
}

impl TableState {
    fn alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell) {
            Some(Alignment::Left) => r#" style="text-align: left""#,
            Some(Alignment::Center) => r#" style="text-align: center""#,
            Some(Alignment::Right) => r#" style="text-align: right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

impl XhtmlRenderer {
    /// Create a new renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            ..Self::default()
        }
    }

    /// Render soft line breaks as `<br />` instead of a newline.
    #[must_use]
    pub fn with_hard_line_break(mut self, enabled: bool) -> Self {
        self.hard_line_break = enabled;
        self
    }

    /// Render markdown events to XHTML.
    pub fn render<'a, I>(mut self, events: I) -> String
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.event(event);
        }
        self.output
    }

    /// Render a single event.
    pub fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.output.push_str(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.output.push_str("<br />"),
            Event::Rule => self.output.push_str("<hr />"),
            Event::TaskListMarker(checked) => {
                self.output.push_str(if checked { "[x] " } else { "[ ] " });
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported in Confluence
            }
        }
    }

    /// Output buffer, for callers that emit their own markup between events.
    pub(crate) fn output_mut(&mut self) -> &mut String {
        &mut self.output
    }

    /// Consume the renderer and return the rendered output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.output
    }

    #[allow(clippy::too_many_lines)]
    fn start_tag(&mut self, tag: Tag<'_>) {
        if let Some(image) = &mut self.image {
            // Only text contributes to alt text
            if matches!(tag, Tag::Image { .. }) {
                image.depth += 1;
            }
            return;
        }

        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, id, .. } => {
                let level = heading_level_to_num(level);
                match id {
                    Some(id) => {
                        write!(self.output, r#"<h{level} id="{}">"#, escape_xml(&id)).unwrap();
                    }
                    None => write!(self.output, "<h{level}>").unwrap(),
                }
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|lang| !lang.is_empty())
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(PendingCode {
                    lang,
                    content: String::new(),
                });
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table = TableState {
                    alignments,
                    ..TableState::default()
                };
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.in_head = true;
                self.table.cell = 0;
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.cell = 0;
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let tag = if self.table.in_head { "th" } else { "td" };
                write!(self.output, "<{tag}{}>", self.table.alignment_style()).unwrap();
            }
            Tag::Emphasis => self.output.push_str("<em>"),
            Tag::Strong => self.output.push_str("<strong>"),
            Tag::Strikethrough => self.output.push_str("<s>"),
            Tag::Superscript => self.output.push_str("<sup>"),
            Tag::Subscript => self.output.push_str("<sub>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let scheme = if link_type == LinkType::Email {
                    "mailto:"
                } else {
                    ""
                };
                write!(
                    self.output,
                    r#"<a href="{scheme}{}""#,
                    escape_xml(&dest_url)
                )
                .unwrap();
                if !title.is_empty() {
                    write!(self.output, r#" title="{}""#, escape_xml(&title)).unwrap();
                }
                self.output.push('>');
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image = Some(PendingImage {
                    src: dest_url.into_string(),
                    title: title.into_string(),
                    alt: String::new(),
                    depth: 0,
                });
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        if let Some(image) = &mut self.image {
            if tag == TagEnd::Image {
                if image.depth == 0 {
                    self.finish_image();
                } else {
                    image.depth -= 1;
                }
            }
            return;
        }

        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(level) => {
                write!(self.output, "</h{}>", heading_level_to_num(level)).unwrap();
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    match code.lang {
                        Some(lang) => write!(
                            self.output,
                            r#"<pre><code class="language-{}">{}</code></pre>"#,
                            escape_xml(&lang),
                            escape_xml(&code.content)
                        )
                        .unwrap(),
                        None => write!(
                            self.output,
                            "<pre><code>{}</code></pre>",
                            escape_xml(&code.content)
                        )
                        .unwrap(),
                    }
                }
            }
            TagEnd::List(ordered) => self.output.push_str(if ordered { "</ol>" } else { "</ul>" }),
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.table.in_head = false;
                self.output.push_str("</tr></thead><tbody>");
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output
                    .push_str(if self.table.in_head { "</th>" } else { "</td>" });
                self.table.cell += 1;
            }
            TagEnd::Emphasis => self.output.push_str("</em>"),
            TagEnd::Strong => self.output.push_str("</strong>"),
            TagEnd::Strikethrough => self.output.push_str("</s>"),
            TagEnd::Superscript => self.output.push_str("</sup>"),
            TagEnd::Subscript => self.output.push_str("</sub>"),
            TagEnd::Link => self.output.push_str("</a>"),
            // Images are written once their alt text is complete
            TagEnd::Image => {}
        }
    }

    fn finish_image(&mut self) {
        let Some(image) = self.image.take() else {
            return;
        };
        write!(
            self.output,
            r#"<img src="{}" alt="{}""#,
            escape_xml(&image.src),
            escape_xml(&image.alt)
        )
        .unwrap();
        if !image.title.is_empty() {
            write!(self.output, r#" title="{}""#, escape_xml(&image.title)).unwrap();
        }
        self.output.push_str(" />");
    }

    fn text(&mut self, text: &str) {
        if let Some(code) = &mut self.code {
            code.content.push_str(text);
        } else if let Some(image) = &mut self.image {
            image.alt.push_str(text);
        } else {
            self.output.push_str(&escape_xml(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if let Some(image) = &mut self.image {
            image.alt.push_str(code);
        } else {
            write!(self.output, "<code>{}</code>", escape_xml(code)).unwrap();
        }
    }

    fn soft_break(&mut self) {
        if let Some(image) = &mut self.image {
            image.alt.push(' ');
        } else if self.hard_line_break {
            self.output.push_str("<br />");
        } else {
            self.output.push('\n');
        }
    }
}

/// Convert heading level enum to number (1-6).
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Escape text for use in XML content and attribute values.
#[must_use]
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{Options, Parser};

    fn render(markdown: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_HEADING_ATTRIBUTES;
        XhtmlRenderer::new().render(Parser::new_ext(markdown, options))
    }

    #[test]
    fn test_basic_paragraph() {
        assert_eq!(render("Hello, world!"), "<p>Hello, world!</p>");
    }

    #[test]
    fn test_heading_with_id_attribute() {
        assert_eq!(render("## Setup {#setup}"), r#"<h2 id="setup">Setup</h2>"#);
        assert_eq!(render("# Title"), "<h1>Title</h1>");
    }

    #[test]
    fn test_emphasis_and_strikethrough() {
        assert_eq!(
            render("*a* **b** ~~c~~"),
            "<p><em>a</em> <strong>b</strong> <s>c</s></p>"
        );
    }

    #[test]
    fn test_link_with_title() {
        assert_eq!(
            render(r#"[docs](https://example.com "Example")"#),
            r#"<p><a href="https://example.com" title="Example">docs</a></p>"#
        );
    }

    #[test]
    fn test_email_autolink_gets_mailto() {
        assert_eq!(
            render("<team@example.com>"),
            r#"<p><a href="mailto:team@example.com">team@example.com</a></p>"#
        );
    }

    #[test]
    fn test_image_is_self_closing() {
        assert_eq!(
            render("![A *nice* logo](https://example.com/logo.png)"),
            r#"<p><img src="https://example.com/logo.png" alt="A nice logo" /></p>"#
        );
    }

    #[test]
    fn test_code_block_escapes_content() {
        assert_eq!(
            render("```mermaid\ngraph TD; A-->B\n```"),
            r#"<pre><code class="language-mermaid">graph TD; A--&gt;B
</code></pre>"#
        );
    }

    #[test]
    fn test_indented_code_block_without_language() {
        let html = render("    let x = 1;\n");
        assert!(html.starts_with("<pre><code>let x = 1;"));
        assert!(html.ends_with("</code></pre>"));
    }

    #[test]
    fn test_void_elements() {
        assert_eq!(render("a  \nb\n\n---"), "<p>a<br />b</p><hr />");
    }

    #[test]
    fn test_soft_break() {
        assert_eq!(render("a\nb"), "<p>a\nb</p>");
        let hard = XhtmlRenderer::new()
            .with_hard_line_break(true)
            .render(Parser::new("a\nb"));
        assert_eq!(hard, "<p>a<br />b</p>");
    }

    #[test]
    fn test_table_with_alignment() {
        assert_eq!(
            render("| A | B |\n|:--|--:|\n| 1 | 2 |"),
            concat!(
                r#"<table><thead><tr><th style="text-align: left">A</th>"#,
                r#"<th style="text-align: right">B</th></tr></thead>"#,
                r#"<tbody><tr><td style="text-align: left">1</td>"#,
                r#"<td style="text-align: right">2</td></tr></tbody></table>"#
            )
        );
    }

    #[test]
    fn test_ordered_list_with_start() {
        assert_eq!(render("3. c\n4. d"), r#"<ol start="3"><li>c</li><li>d</li></ol>"#);
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(render("> quoted"), "<blockquote><p>quoted</p></blockquote>");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }
}
