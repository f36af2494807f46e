//! Confluence storage-format macro markup.

use std::fmt::Write;

use crate::xhtml::escape_xml;

/// Table of contents macro prepended to every rendered page.
pub const TOC_MACRO: &str = "
<ac:structured-macro ac:name=\"toc\">
\t<ac:parameter ac:name=\"outline\">true</ac:parameter>
</ac:structured-macro>
";

/// Code macro theme.
const CODE_THEME: &str = "RDark";

/// Kind of attachment macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttachmentMacro {
    Image,
    Link,
}

/// Open an attachment macro, leaving it ready for the node's children.
///
/// Links continue into an open CDATA link body.
pub(crate) fn attachment_start(
    kind: AttachmentMacro,
    filename: &str,
    page_title: Option<&str>,
    out: &mut String,
) {
    out.push_str(match kind {
        AttachmentMacro::Image => "<ac:image>",
        AttachmentMacro::Link => "<ac:link>",
    });
    write!(out, r#"<ri:attachment ri:filename="{}">"#, escape_xml(filename)).unwrap();
    if let Some(title) = page_title {
        write!(out, r#"<ri:page ri:content-title="{}"/>"#, escape_xml(title)).unwrap();
    }
    if kind == AttachmentMacro::Link {
        out.push_str("</ri:attachment><ac:plain-text-link-body><![CDATA[");
    }
}

/// Close an attachment macro opened by [`attachment_start`].
pub(crate) fn attachment_end(kind: AttachmentMacro, out: &mut String) {
    out.push_str(match kind {
        AttachmentMacro::Image => "</ri:attachment></ac:image>",
        AttachmentMacro::Link => "]]></ac:plain-text-link-body></ac:link>",
    });
}

/// Write a code macro with line numbers.
pub(crate) fn code_macro(language: &str, content: &str, out: &mut String) {
    out.push_str(r#"<ac:structured-macro ac:name="code">"#);
    out.push_str(r#"<ac:parameter ac:name="linenumbers">true</ac:parameter>"#);
    write!(
        out,
        r#"<ac:parameter ac:name="theme">{CODE_THEME}</ac:parameter>"#
    )
    .unwrap();
    write!(
        out,
        r#"<ac:parameter ac:name="language">{}</ac:parameter>"#,
        escape_xml(language)
    )
    .unwrap();
    out.push_str("<ac:plain-text-body><![CDATA[");
    push_cdata(content, out);
    out.push_str("]]></ac:plain-text-body>");
    out.push_str("</ac:structured-macro>");
}

/// Open a tip macro with a rich-text body.
pub(crate) fn tip_start(title: &str, out: &mut String) {
    out.push_str(r#"<ac:structured-macro ac:name="tip">"#);
    write!(
        out,
        r#"<ac:parameter ac:name="title">{}</ac:parameter>"#,
        escape_xml(title)
    )
    .unwrap();
    out.push_str("<ac:rich-text-body>");
}

/// Close a tip macro opened by [`tip_start`].
pub(crate) fn tip_end(out: &mut String) {
    out.push_str("</ac:rich-text-body></ac:structured-macro>");
}

/// Append literal text inside an open CDATA section.
///
/// A `]]>` in the text would end the section early, so it is split across
/// two sections.
pub(crate) fn push_cdata(text: &str, out: &mut String) {
    out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_image_attachment_without_page() {
        let mut out = String::new();
        attachment_start(AttachmentMacro::Image, "a.png", None, &mut out);
        attachment_end(AttachmentMacro::Image, &mut out);
        assert_eq!(
            out,
            r#"<ac:image><ri:attachment ri:filename="a.png"></ri:attachment></ac:image>"#
        );
    }

    #[test]
    fn test_link_attachment_with_page() {
        let mut out = String::new();
        attachment_start(AttachmentMacro::Link, "spec.pdf", Some("Guide"), &mut out);
        out.push_str("the spec");
        attachment_end(AttachmentMacro::Link, &mut out);
        assert_eq!(
            out,
            concat!(
                r#"<ac:link><ri:attachment ri:filename="spec.pdf">"#,
                r#"<ri:page ri:content-title="Guide"/></ri:attachment>"#,
                "<ac:plain-text-link-body><![CDATA[the spec]]></ac:plain-text-link-body></ac:link>"
            )
        );
    }

    #[test]
    fn test_attachment_attributes_are_escaped() {
        let mut out = String::new();
        attachment_start(AttachmentMacro::Image, "a&b.png", Some("Q&A"), &mut out);
        assert!(out.contains(r#"ri:filename="a&amp;b.png""#));
        assert!(out.contains(r#"ri:content-title="Q&amp;A""#));
    }

    #[test]
    fn test_code_macro() {
        let mut out = String::new();
        code_macro("go", "if a < b {}\n", &mut out);
        assert_eq!(
            out,
            concat!(
                r#"<ac:structured-macro ac:name="code">"#,
                r#"<ac:parameter ac:name="linenumbers">true</ac:parameter>"#,
                r#"<ac:parameter ac:name="theme">RDark</ac:parameter>"#,
                r#"<ac:parameter ac:name="language">go</ac:parameter>"#,
                "<ac:plain-text-body><![CDATA[if a < b {}\n]]></ac:plain-text-body>",
                "</ac:structured-macro>"
            )
        );
    }

    #[test]
    fn test_tip_macro() {
        let mut out = String::new();
        tip_start("提示", &mut out);
        out.push_str("<p>x</p>");
        tip_end(&mut out);
        assert_eq!(
            out,
            concat!(
                r#"<ac:structured-macro ac:name="tip">"#,
                r#"<ac:parameter ac:name="title">提示</ac:parameter>"#,
                "<ac:rich-text-body><p>x</p></ac:rich-text-body></ac:structured-macro>"
            )
        );
    }

    #[test]
    fn test_cdata_terminator_is_split() {
        let mut out = String::new();
        push_cdata("a]]>b", &mut out);
        assert_eq!(out, "a]]]]><![CDATA[>b");
    }
}
