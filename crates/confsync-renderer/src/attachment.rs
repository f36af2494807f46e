//! Classification of link and image destinations as page attachments.
//!
//! A destination is an attachment when it is a document-relative path: no
//! URL scheme, not absolute, not a bare `#fragment`. The directory part of the
//! path decides which page owns the file. Files collected in the attachments
//! folder (`assets` by default) belong to the page of the folder's parent, so
//! `guide/assets/shot.png` is addressed like `guide/shot.png`.

/// Default name of the folder that collects a page's attachments.
pub const DEFAULT_ATTACHMENTS_DIR: &str = "assets";

/// Directory an attachment lives in, relative to the referencing document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttachmentDir {
    /// Same directory as the document (`.`).
    Current,
    /// Another directory, which maps to the page titled after its last segment.
    Page(String),
}

impl AttachmentDir {
    /// Directory as a path string; `"."` for [`AttachmentDir::Current`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Current => ".",
            Self::Page(dir) => dir,
        }
    }

    /// Title of the page owning a file in another directory.
    ///
    /// Returns `None` for [`AttachmentDir::Current`], whose owning page depends
    /// on the referencing document.
    #[must_use]
    pub fn page_title(&self) -> Option<&str> {
        match self {
            Self::Current => None,
            Self::Page(dir) => Some(dir.rsplit('/').next().unwrap_or(dir)),
        }
    }
}

/// Attachment referenced by an image or link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttachmentRef {
    /// Destination path as written, without query or fragment.
    pub path: String,
    /// File name (final path segment).
    pub filename: String,
    /// Directory the file lives in.
    pub dir: AttachmentDir,
}

/// Decides whether destinations reference local attachments.
#[derive(Debug, Clone)]
pub struct AttachmentClassifier {
    attachments_dir: String,
}

impl Default for AttachmentClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ATTACHMENTS_DIR)
    }
}

impl AttachmentClassifier {
    /// Create a classifier with the given attachments folder name.
    #[must_use]
    pub fn new(attachments_dir: impl Into<String>) -> Self {
        Self {
            attachments_dir: attachments_dir.into(),
        }
    }

    /// Name of the attachments folder.
    #[must_use]
    pub fn attachments_dir(&self) -> &str {
        &self.attachments_dir
    }

    /// Classify a destination.
    ///
    /// Returns `None` when the destination is external, absolute, empty or
    /// fragment-only; otherwise the directory the attachment lives in.
    ///
    /// # Examples
    ///
    /// ```
    /// use confsync_renderer::{AttachmentClassifier, AttachmentDir};
    ///
    /// let classifier = AttachmentClassifier::default();
    /// assert_eq!(classifier.classify("https://example.com/a.png"), None);
    /// assert_eq!(classifier.classify("shot.png"), Some(AttachmentDir::Current));
    /// assert_eq!(classifier.classify("assets/shot.png"), Some(AttachmentDir::Current));
    /// assert_eq!(
    ///     classifier.classify("img/shot.png"),
    ///     Some(AttachmentDir::Page("img".to_owned()))
    /// );
    /// ```
    #[must_use]
    pub fn classify(&self, destination: &str) -> Option<AttachmentDir> {
        let path = local_path(destination)?;
        if path.starts_with('/') {
            return None;
        }

        let dir = match path.rfind('/') {
            Some(pos) => &path[..pos],
            None => "",
        };
        let mut segments = clean_segments(dir);
        if segments.last() == Some(&self.attachments_dir.as_str()) {
            segments.pop();
        }

        if segments.is_empty() {
            Some(AttachmentDir::Current)
        } else {
            Some(AttachmentDir::Page(segments.join("/")))
        }
    }

    /// Classify a destination and describe the referenced attachment.
    #[must_use]
    pub fn reference(&self, destination: &str) -> Option<AttachmentRef> {
        let dir = self.classify(destination)?;
        let path = local_path(destination)?;
        let trimmed = path.trim_end_matches('/');
        let filename = trimmed.rsplit('/').next().unwrap_or(trimmed);
        Some(AttachmentRef {
            path: path.to_owned(),
            filename: filename.to_owned(),
            dir,
        })
    }
}

/// Path component of a scheme-less destination.
///
/// Returns `None` for destinations that are empty, fragment-only, carry a
/// URL scheme, or have a colon in their first segment (not a valid relative
/// reference).
fn local_path(destination: &str) -> Option<&str> {
    if destination.is_empty() || destination.starts_with('#') {
        return None;
    }

    let end = destination.find(['?', '#']).unwrap_or(destination.len());
    let path = &destination[..end];
    if path.is_empty() {
        return None;
    }

    let first_segment = path.split('/').next().unwrap_or(path);
    if first_segment.contains(':') {
        return None;
    }

    Some(path)
}

/// Lexically clean a relative directory into its segments.
///
/// Drops empty and `.` segments and collapses `..` against preceding
/// segments. Leading `..` segments are kept.
fn clean_segments(dir: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in dir.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            _ => segments.push(segment),
        }
    }
    segments
}
