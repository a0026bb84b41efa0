//! MIME body tree.

use super::message::{HeaderField, Message};
use crate::report::Diagnostic;

/// A `name=value` parameter of Content-Type or Content-Disposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub value: String,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// MIME header fields shared by single and multipart bodies.
///
/// `content_type` and `transfer_encoding` hold the declared values
/// (lower-cased); the effective values are available through
/// [`MimeFields::mime_type`] and [`MimeFields::transfer_encoding`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeFields {
    pub content_type: Option<String>,
    pub charset: Option<String>,
    pub content_name: Option<String>,
    pub boundary: Option<String>,
    pub content_type_params: Vec<Param>,
    pub transfer_encoding: Option<String>,
    pub content_id: Option<String>,
    pub description: Option<String>,
    pub disposition: Option<String>,
    pub disposition_file_name: Option<String>,
    pub disposition_params: Vec<Param>,
    pub content_languages: Vec<String>,
    pub other_headers: Vec<HeaderField>,
    /// Type used when nothing is declared (`message/rfc822` inside a digest).
    pub default_type: Option<&'static str>,
}

impl MimeFields {
    /// Effective `type/subtype`.
    pub fn mime_type(&self) -> &str {
        self.content_type
            .as_deref()
            .or(self.default_type)
            .unwrap_or("text/plain")
    }

    pub fn media_type(&self) -> &str {
        self.mime_type().split('/').next().unwrap_or("")
    }

    pub fn is_text(&self) -> bool {
        self.media_type() == "text"
    }

    pub fn is_message(&self) -> bool {
        self.media_type() == "message"
    }

    pub fn is_multipart(&self) -> bool {
        self.media_type() == "multipart"
    }

    /// Effective transfer encoding, `7bit` when undeclared.
    pub fn effective_transfer_encoding(&self) -> &str {
        self.transfer_encoding.as_deref().unwrap_or("7bit")
    }

    pub fn is_attachment(&self) -> bool {
        self.disposition
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case("attachment"))
    }

    /// Best file name: disposition filename first, then the content-type name.
    pub fn file_name(&self) -> Option<&str> {
        self.disposition_file_name
            .as_deref()
            .or(self.content_name.as_deref())
            .filter(|n| !n.trim().is_empty())
    }

    /// Charset to decode text with, `us-ascii` when undeclared.
    pub fn effective_charset(&self) -> &str {
        self.charset.as_deref().unwrap_or("us-ascii")
    }

    pub fn other_header(&self, name: &str) -> Option<&str> {
        self.other_headers
            .iter()
            .find(|h| h.is(name))
            .map(|h| h.value.as_str())
    }
}

/// Body of a message or of a multipart part.
#[derive(Debug, Clone)]
pub enum Body {
    Single(SingleBody),
    Multi(MultiBody),
}

impl Body {
    pub fn fields(&self) -> &MimeFields {
        match self {
            Self::Single(s) => &s.fields,
            Self::Multi(m) => &m.fields,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Single(s) => &s.diagnostics,
            Self::Multi(m) => &m.diagnostics,
        }
    }

    /// Visit every single body in document order, including those inside
    /// child messages.
    pub fn for_each_single<'a>(&'a self, f: &mut dyn FnMut(&'a SingleBody)) {
        match self {
            Self::Single(single) => {
                f(single);
                if let LeafContent::ChildMessage(child) = &single.content {
                    child.body.for_each_single(f);
                }
            }
            Self::Multi(multi) => {
                for part in &multi.parts {
                    part.for_each_single(f);
                }
            }
        }
    }
}

/// A multipart container.
#[derive(Debug, Clone)]
pub struct MultiBody {
    pub fields: MimeFields,
    pub preamble: Option<String>,
    /// Empty when no part could be found; written as `MissingBody`.
    pub parts: Vec<Body>,
    pub epilogue: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A leaf part.
#[derive(Debug, Clone)]
pub struct SingleBody {
    pub fields: MimeFields,
    pub content: LeafContent,
    pub diagnostics: Vec<Diagnostic>,
}

impl SingleBody {
    pub fn is_phantom(&self) -> bool {
        matches!(self.content, LeafContent::Phantom(_))
    }
}

/// What a leaf holds.
#[derive(Debug, Clone)]
pub enum LeafContent {
    /// Payload bytes after transfer decoding.
    Data(Vec<u8>),
    /// Content referenced but not present (external-body, detached
    /// attachments). Holds the part text, which is not the payload.
    Phantom(String),
    /// An encapsulated message.
    ChildMessage(Box<Message>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let fields = MimeFields::default();
        assert_eq!(fields.mime_type(), "text/plain");
        assert!(fields.is_text());
        assert_eq!(fields.effective_transfer_encoding(), "7bit");
        assert_eq!(fields.effective_charset(), "us-ascii");
        assert!(!fields.is_attachment());
    }

    #[test]
    fn test_digest_default_type() {
        let fields = MimeFields {
            default_type: Some("message/rfc822"),
            ..Default::default()
        };
        assert!(fields.is_message());
        let declared = MimeFields {
            content_type: Some("text/html".into()),
            default_type: Some("message/rfc822"),
            ..Default::default()
        };
        assert_eq!(declared.mime_type(), "text/html");
    }

    #[test]
    fn test_file_name_prefers_disposition() {
        let fields = MimeFields {
            content_name: Some("ct.pdf".into()),
            disposition_file_name: Some("disp.pdf".into()),
            disposition: Some("Attachment".into()),
            ..Default::default()
        };
        assert_eq!(fields.file_name(), Some("disp.pdf"));
        assert!(fields.is_attachment());
    }
}
