//! How a leaf payload is represented in the document.
//!
//! Placement decides inline vs external; [`ContentEncodingPolicy::encode`]
//! picks the representation of the bytes wherever they end up (inline
//! `BodyContent` or a wrapped side file).

use std::borrow::Cow;

use base64::Engine as _;

use super::{qp, xmlchars};
use crate::config::ConversionSettings;
use crate::model::body::MimeFields;
use crate::report::Diagnostic;

/// Width of base64 lines written into documents.
const BASE64_LINE: usize = 76;

pub const QP_INVALID_XML_WARNING: &str =
    "Used 'quoted-printable' because the content contains characters that are not valid in XML";

/// Where a payload goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Inline,
    External,
}

/// Transfer encoding applied to `Content`. Raw text carries none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTransferEncoding {
    Base64,
    QuotedPrintable,
}

impl ContentTransferEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
        }
    }
}

/// Payload text ready for a `Content` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedContent {
    pub content: String,
    pub transfer_encoding: Option<ContentTransferEncoding>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentEncodingPolicy {
    pub save_externally: bool,
    pub preserve_transfer_encoding: bool,
}

impl ContentEncodingPolicy {
    pub fn from_settings(settings: &ConversionSettings) -> Self {
        Self {
            save_externally: settings.save_attachments_and_binary_content_externally,
            preserve_transfer_encoding: settings.preserve_content_transfer_encoding_if_possible,
        }
    }

    /// Attachments and anything that is not `text/*` or `message/*` go to a
    /// side file when externalization is enabled.
    pub fn placement(&self, fields: &MimeFields) -> Placement {
        let textual = fields.is_text() || fields.is_message();
        if self.save_externally && (fields.is_attachment() || !textual) {
            Placement::External
        } else {
            Placement::Inline
        }
    }

    /// Choose the representation of `data`, the transfer-decoded payload.
    pub fn encode(&self, fields: &MimeFields, data: &[u8]) -> EncodedContent {
        let declared = fields.effective_transfer_encoding();

        if !fields.is_text() || (self.preserve_transfer_encoding && declared == "base64") {
            return EncodedContent {
                content: encode_base64(data),
                transfer_encoding: Some(ContentTransferEncoding::Base64),
                diagnostics: Vec::new(),
            };
        }

        let charset = fields.effective_charset();
        match decode_text(charset, data) {
            Some(text) if xmlchars::is_valid_xml_text(&text) => {
                if self.preserve_transfer_encoding && declared == "quoted-printable" {
                    EncodedContent {
                        content: qp::encode(data),
                        transfer_encoding: Some(ContentTransferEncoding::QuotedPrintable),
                        diagnostics: Vec::new(),
                    }
                } else {
                    EncodedContent {
                        content: text.into_owned(),
                        transfer_encoding: None,
                        diagnostics: Vec::new(),
                    }
                }
            }
            Some(_) => EncodedContent {
                content: qp::encode(data),
                transfer_encoding: Some(ContentTransferEncoding::QuotedPrintable),
                diagnostics: vec![Diagnostic::warning(QP_INVALID_XML_WARNING)],
            },
            None => EncodedContent {
                content: qp::encode(data),
                transfer_encoding: Some(ContentTransferEncoding::QuotedPrintable),
                diagnostics: vec![Diagnostic::warning(format!(
                    "Used 'quoted-printable' because the content could not be decoded as '{charset}'"
                ))],
            },
        }
    }
}

/// Decode text strictly. `None` when the charset is unknown (and the bytes
/// are not UTF-8) or the bytes are malformed for it.
pub fn decode_text<'a>(charset: &str, data: &'a [u8]) -> Option<Cow<'a, str>> {
    match encoding_rs::Encoding::for_label(charset.trim().as_bytes()) {
        Some(encoding) => encoding.decode_without_bom_handling_and_without_replacement(data),
        None => std::str::from_utf8(data).ok().map(Cow::Borrowed),
    }
}

/// Standard base64, broken into fixed-width lines.
pub fn encode_base64(data: &[u8]) -> String {
    let flat = base64::engine::general_purpose::STANDARD.encode(data);
    let mut out = String::with_capacity(flat.len() + flat.len() / BASE64_LINE + 1);
    for (i, chunk) in flat.as_bytes().chunks(BASE64_LINE).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        // base64 output is ASCII.
        out.push_str(&String::from_utf8_lossy(chunk));
    }
    out
}
