//! Node kinds the storage renderer dispatches on.

use pulldown_cmark::{CodeBlockKind, LinkType, Tag, TagEnd};

/// A node being entered, classified from its start tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Node<'a> {
    Image { dest: &'a str },
    /// Email autolinks carry the bare address, without `mailto:`.
    Link { dest: &'a str, email: bool },
    /// Fenced or indented code block. `language` is the first word of the
    /// info string, empty for indented blocks.
    CodeBlock { language: &'a str },
    BlockQuote,
    Other,
}

impl<'a> Node<'a> {
    pub(crate) fn entering(tag: &'a Tag<'_>) -> Self {
        match tag {
            Tag::Image { dest_url, .. } => Self::Image { dest: dest_url },
            Tag::Link {
                link_type,
                dest_url,
                ..
            } => Self::Link {
                dest: dest_url,
                email: *link_type == LinkType::Email,
            },
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => Self::CodeBlock {
                language: info.split_whitespace().next().unwrap_or(""),
            },
            Tag::CodeBlock(CodeBlockKind::Indented) => Self::CodeBlock { language: "" },
            Tag::BlockQuote(_) => Self::BlockQuote,
            _ => Self::Other,
        }
    }
}

/// A node being left, classified from its end tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Image,
    Link,
    CodeBlock,
    BlockQuote,
    Other,
}

impl NodeKind {
    pub(crate) fn leaving(tag: TagEnd) -> Self {
        match tag {
            TagEnd::Image => Self::Image,
            TagEnd::Link => Self::Link,
            TagEnd::CodeBlock => Self::CodeBlock,
            TagEnd::BlockQuote(_) => Self::BlockQuote,
            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::CowStr;

    #[test]
    fn test_entering_classifies_destinations() {
        let image = Tag::Image {
            link_type: LinkType::Inline,
            dest_url: CowStr::Borrowed("a.png"),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        };
        assert_eq!(Node::entering(&image), Node::Image { dest: "a.png" });

        let link = Tag::Link {
            link_type: LinkType::Inline,
            dest_url: CowStr::Borrowed("b.pdf"),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        };
        assert_eq!(
            Node::entering(&link),
            Node::Link {
                dest: "b.pdf",
                email: false
            }
        );

        let autolink = Tag::Link {
            link_type: LinkType::Email,
            dest_url: CowStr::Borrowed("team@example.com"),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        };
        assert_eq!(
            Node::entering(&autolink),
            Node::Link {
                dest: "team@example.com",
                email: true
            }
        );
    }

    #[test]
    fn test_entering_code_blocks() {
        let fenced = Tag::CodeBlock(CodeBlockKind::Fenced(CowStr::Borrowed("go")));
        assert_eq!(Node::entering(&fenced), Node::CodeBlock { language: "go" });

        let with_attributes =
            Tag::CodeBlock(CodeBlockKind::Fenced(CowStr::Borrowed("go title=main.go")));
        assert_eq!(
            Node::entering(&with_attributes),
            Node::CodeBlock { language: "go" }
        );

        let blank = Tag::CodeBlock(CodeBlockKind::Fenced(CowStr::Borrowed("  ")));
        assert_eq!(Node::entering(&blank), Node::CodeBlock { language: "" });

        let indented = Tag::CodeBlock(CodeBlockKind::Indented);
        assert_eq!(Node::entering(&indented), Node::CodeBlock { language: "" });
    }

    #[test]
    fn test_other_nodes() {
        assert_eq!(Node::entering(&Tag::Paragraph), Node::Other);
        assert_eq!(Node::entering(&Tag::BlockQuote(None)), Node::BlockQuote);
        assert_eq!(NodeKind::leaving(TagEnd::Paragraph), NodeKind::Other);
        assert_eq!(NodeKind::leaving(TagEnd::BlockQuote(None)), NodeKind::BlockQuote);
        assert_eq!(NodeKind::leaving(TagEnd::Link), NodeKind::Link);
    }
}
