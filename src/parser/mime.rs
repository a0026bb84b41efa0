//! MIME decomposition: one message record into a [`Message`] with a fully
//! resolved body tree.
//!
//! Decomposition never fails on bad structure below the top-level header
//! block. Missing boundaries, undecodable payloads, unknown charsets and
//! encoded message parts are recorded as warnings on the affected node and
//! the content is kept as opaque bytes.

use tracing::debug;

use super::header::{
    self, decode_encoded_words_checked, first, line_spans, parse_header_block, parse_structured,
    split_header_body, trim_eol, StructuredValue,
};
use super::mbox::MessageRecord;
use super::quirks;
use crate::digest::HashAlgorithm;
use crate::encoding::transfer::decode_transfer;
use crate::error::{ConvertError, Result};
use crate::model::account::Account;
use crate::model::address::{parse_address_list, AddressEntry, EmailAddress};
use crate::model::body::{Body, LeafContent, MimeFields, MultiBody, Param, SingleBody};
use crate::model::message::{HeaderField, Message, MessageProperties, StatusFlag};
use crate::report::Diagnostic;

/// Nesting limit for multiparts and encapsulated messages.
pub const MAX_DEPTH: usize = 64;

/// Headers lifted into dedicated MIME elements.
const MAPPED_MIME_HEADERS: [&str; 6] = [
    "content-type",
    "content-transfer-encoding",
    "content-id",
    "content-description",
    "content-disposition",
    "content-language",
];

/// Decompose one mbox record into a top-level message.
///
/// Errors only when the record has no header fields at all.
pub fn decompose(
    record: &MessageRecord,
    algorithm: HashAlgorithm,
    account: &Account,
) -> Result<Message> {
    let bytes = record.unmangled();
    let mut message = parse_message(&bytes, 0).map_err(|e| match e {
        ConvertError::MimeError(reason) => ConvertError::ParseError {
            offset: record.start,
            reason,
        },
        other => other,
    })?;

    let (hash, size) = record.digest(algorithm);
    message.properties = Some(MessageProperties {
        eol: record.eol,
        hash,
        size,
    });
    message.incomplete.extend(record.incomplete.iter().cloned());

    let mut diagnostics = record.diagnostics.clone();
    diagnostics.append(&mut message.diagnostics);
    message.diagnostics = diagnostics;

    message.status_flags = quirks::status_flags(&message.headers, record.mbx.as_ref());
    let from_owner = message
        .first_from()
        .is_some_and(|from| account.is_owner(&from.address));
    if from_owner && !message.has_recipients() && !message.status_flags.contains(&StatusFlag::Draft)
    {
        message.status_flags.push(StatusFlag::Draft);
        message.status_flags.sort();
    }

    if !message.status_flags.contains(&StatusFlag::Draft) {
        if message.from.is_empty() {
            message
                .diagnostics
                .push(Diagnostic::warning("The message does not have a From header."));
        }
        if !message.has_recipients()
            && message.header("To").is_none()
            && message.header("Cc").is_none()
            && message.header("Bcc").is_none()
        {
            message
                .diagnostics
                .push(Diagnostic::warning("The message does not have a To, Cc, or Bcc."));
        }
    }

    debug!(
        offset = record.start,
        subject = message.subject.as_deref().unwrap_or(""),
        "Decomposed message"
    );
    Ok(message)
}

/// Parse a message (top-level or encapsulated) from its header and body bytes.
pub fn parse_message(bytes: &[u8], depth: usize) -> Result<Message> {
    let split = split_header_body(bytes);
    let block = parse_header_block(split.headers);
    if block.fields.is_empty() {
        return Err(ConvertError::MimeError(
            "message has no parseable header fields".into(),
        ));
    }

    let mut diagnostics = Vec::new();
    if split.missing_separator {
        diagnostics.push(Diagnostic::warning(
            "The header block is not terminated by a blank line; the remainder is treated as body",
        ));
    }
    for line in &block.malformed_lines {
        diagnostics.push(Diagnostic::warning(format!(
            "Header line without a field name ignored: '{line}'"
        )));
    }

    let raw = &block.fields;
    let mut decode = |value: &str| {
        let (text, mut diags) = decode_encoded_words_checked(value);
        diagnostics.append(&mut diags);
        text
    };

    let headers: Vec<HeaderField> = raw
        .iter()
        .map(|f| HeaderField::new(f.name.clone(), decode(&f.value)))
        .collect();
    let subject = first(raw, "Subject").map(&mut decode);
    let comments = all(raw, "Comments").map(&mut decode).collect();
    let keywords = all(raw, "Keywords")
        .flat_map(|v| v.split(','))
        .map(|k| decode(k.trim()))
        .filter(|k| !k.is_empty())
        .collect();
    let from = addresses(raw, "From", &mut decode);
    let to = addresses(raw, "To", &mut decode);
    let cc = addresses(raw, "Cc", &mut decode);
    let bcc = addresses(raw, "Bcc", &mut decode);
    let sender = addresses(raw, "Sender", &mut decode)
        .iter()
        .flat_map(|e| e.mailboxes())
        .next()
        .cloned();

    let orig_date = match first(raw, "Date") {
        Some(value) => {
            let parsed = header::parse_date(value);
            if parsed.is_none() {
                diagnostics.push(Diagnostic::warning(format!(
                    "Could not parse the Date header '{value}'"
                )));
            }
            parsed
        }
        None => None,
    };

    let body = parse_entity(raw, split.body, depth, None, true);

    Ok(Message {
        message_id: first(raw, "Message-ID")
            .map(header::extract_angle_bracket)
            .filter(|id| !id.is_empty()),
        mime_version: first(raw, "MIME-Version")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
        orig_date,
        from,
        sender,
        to,
        cc,
        bcc,
        in_reply_to: all(raw, "In-Reply-To")
            .flat_map(header::extract_all_angle_brackets)
            .collect(),
        references: all(raw, "References")
            .flat_map(header::extract_all_angle_brackets)
            .collect(),
        subject,
        comments,
        keywords,
        headers,
        status_flags: Vec::new(),
        body,
        incomplete: Vec::new(),
        properties: None,
        diagnostics,
    })
}

fn all<'a>(fields: &'a [HeaderField], name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    fields
        .iter()
        .filter(move |f| f.is(name))
        .map(|f| f.value.as_str())
}

/// Parse every header of `name` as an address list, decoding encoded words
/// inside display names after the structure is known.
fn addresses(
    fields: &[HeaderField],
    name: &str,
    decode: &mut impl FnMut(&str) -> String,
) -> Vec<AddressEntry> {
    let mut decode_mailbox = |m: EmailAddress| EmailAddress {
        display_name: decode(&m.display_name),
        address: m.address,
    };
    all(fields, name)
        .flat_map(parse_address_list)
        .map(|entry| match entry {
            AddressEntry::Mailbox(m) => AddressEntry::Mailbox(decode_mailbox(m)),
            AddressEntry::Group { name, members } => AddressEntry::Group {
                name,
                members: members.into_iter().map(&mut decode_mailbox).collect(),
            },
        })
        .collect()
}

/// Parse the MIME headers of an entity.
///
/// For a message root only unmapped `Content-*` headers are kept as other
/// MIME headers (the rest belong to the message), for a body part all
/// unmapped headers are.
pub fn mime_fields(
    fields: &[HeaderField],
    default_type: Option<&'static str>,
    message_root: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> MimeFields {
    let mut decode = |value: &str| {
        let (text, mut diags) = decode_encoded_words_checked(value);
        diagnostics.append(&mut diags);
        text
    };

    let mut mime = MimeFields {
        default_type,
        ..Default::default()
    };

    if let Some(raw) = first(fields, "Content-Type") {
        let StructuredValue { value, params } = parse_structured(raw);
        let well_formed = value.split_once('/').is_some_and(|(t, s)| {
            !t.is_empty() && !s.is_empty() && !t.contains(char::is_whitespace)
        });
        if well_formed {
            mime.content_type = Some(value);
        }
        for Param { name, value } in params {
            match name.as_str() {
                "charset" => mime.charset = Some(value.trim_matches('"').to_string()),
                "name" => mime.content_name = Some(value),
                "boundary" => mime.boundary = Some(value),
                _ => mime.content_type_params.push(Param { name, value }),
            }
        }
    }

    mime.transfer_encoding = first(fields, "Content-Transfer-Encoding")
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());
    mime.content_id = first(fields, "Content-ID")
        .map(header::extract_angle_bracket)
        .filter(|v| !v.is_empty());
    mime.description = first(fields, "Content-Description").map(&mut decode);

    if let Some(raw) = first(fields, "Content-Disposition") {
        let StructuredValue { value, params } = parse_structured(raw);
        if !value.is_empty() {
            mime.disposition = Some(value);
        }
        for Param { name, value } in params {
            if name == "filename" {
                mime.disposition_file_name = Some(value);
            } else {
                mime.disposition_params.push(Param { name, value });
            }
        }
    }

    mime.content_languages = all(fields, "Content-Language")
        .flat_map(|v| v.split(','))
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    mime.other_headers = fields
        .iter()
        .filter(|f| {
            let lower = f.name.to_ascii_lowercase();
            !MAPPED_MIME_HEADERS.contains(&lower.as_str())
                && (!message_root || lower.starts_with("content-"))
        })
        .map(|f| HeaderField::new(f.name.clone(), decode(&f.value)))
        .collect();

    mime
}

/// Parse an entity body given its (raw) header fields.
fn parse_entity(
    fields: &[HeaderField],
    body: &[u8],
    depth: usize,
    default_type: Option<&'static str>,
    message_root: bool,
) -> Body {
    let mut diagnostics = Vec::new();
    let mime = mime_fields(fields, default_type, message_root, &mut diagnostics);
    if let (Some(raw), None) = (first(fields, "Content-Type"), &mime.content_type) {
        diagnostics.push(Diagnostic::warning(format!(
            "Invalid Content-Type '{raw}'; the default type is used"
        )));
    }

    if mime.is_multipart() {
        if depth >= MAX_DEPTH {
            diagnostics.push(Diagnostic::warning(format!(
                "MIME nesting deeper than {MAX_DEPTH} levels; the part is kept as opaque content"
            )));
            return opaque(mime, body, diagnostics);
        }
        let Some(boundary) = mime.boundary.clone().filter(|b| !b.is_empty()) else {
            diagnostics.push(Diagnostic::warning(
                "Multipart content without a boundary parameter; treated as a single part",
            ));
            return opaque(mime, body, diagnostics);
        };
        let Some(split) = split_multipart(body, &boundary) else {
            diagnostics.push(Diagnostic::warning(format!(
                "No boundary line '--{boundary}' found; the multipart is treated as a single part"
            )));
            return opaque(mime, body, diagnostics);
        };
        if !split.closed {
            diagnostics.push(Diagnostic::warning(format!(
                "Missing close delimiter '--{boundary}--'; the multipart ends at the end of its content"
            )));
        }

        let child_default = (mime.mime_type() == "multipart/digest").then_some("message/rfc822");
        let parts: Vec<Body> = split
            .parts
            .iter()
            .map(|part| {
                let part_split = split_header_body(part);
                let block = parse_header_block(part_split.headers);
                let mut part_diags = Vec::new();
                for line in &block.malformed_lines {
                    part_diags.push(Diagnostic::warning(format!(
                        "MIME header line without a field name ignored: '{line}'"
                    )));
                }
                let mut body =
                    parse_entity(&block.fields, part_split.body, depth + 1, child_default, false);
                attach(&mut body, part_diags);
                body
            })
            .collect();
        if parts.is_empty() {
            diagnostics.push(Diagnostic::warning("Item is multipart, but there are no parts"));
        }

        return Body::Multi(MultiBody {
            fields: mime,
            preamble: text_block(split.preamble),
            parts,
            epilogue: text_block(split.epilogue),
            diagnostics,
        });
    }

    let phantom = mime.mime_type() == "message/external-body" || quirks::is_mozilla_detached(fields);
    if phantom {
        return Body::Single(SingleBody {
            fields: mime,
            content: LeafContent::Phantom(header::decode_header_bytes(body)),
            diagnostics,
        });
    }

    if matches!(mime.mime_type(), "message/rfc822" | "message/global") {
        let cte = mime.effective_transfer_encoding();
        if !matches!(cte, "7bit" | "8bit" | "binary") {
            diagnostics.push(Diagnostic::warning(format!(
                "A 'message/rfc822' part was found with an unallowable content-transfer-encoding of '{cte}'. The part is treated as normal content instead of as a child message."
            )));
        } else if depth >= MAX_DEPTH {
            diagnostics.push(Diagnostic::warning(format!(
                "MIME nesting deeper than {MAX_DEPTH} levels; the message is kept as opaque content"
            )));
        } else {
            match parse_message(body, depth + 1) {
                Ok(child) => {
                    return Body::Single(SingleBody {
                        fields: mime,
                        content: LeafContent::ChildMessage(Box::new(child)),
                        diagnostics,
                    });
                }
                Err(e) => diagnostics.push(Diagnostic::warning(format!(
                    "Encapsulated message could not be parsed ({e}); kept as opaque content"
                ))),
            }
        }
    }

    opaque(mime, body, diagnostics)
}

/// A single body holding the transfer-decoded bytes.
fn opaque(mime: MimeFields, body: &[u8], mut diagnostics: Vec<Diagnostic>) -> Body {
    let (data, warning) = decode_transfer(mime.effective_transfer_encoding(), body);
    diagnostics.extend(warning);
    Body::Single(SingleBody {
        fields: mime,
        content: LeafContent::Data(data),
        diagnostics,
    })
}

fn attach(body: &mut Body, mut extra: Vec<Diagnostic>) {
    let target = match body {
        Body::Single(s) => &mut s.diagnostics,
        Body::Multi(m) => &mut m.diagnostics,
    };
    extra.append(target);
    *target = extra;
}

fn text_block(bytes: &[u8]) -> Option<String> {
    let text = header::decode_header_bytes(bytes);
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Boundary-delimited pieces of a multipart body.
#[derive(Debug)]
pub struct MultipartSplit<'a> {
    pub preamble: &'a [u8],
    pub parts: Vec<&'a [u8]>,
    pub epilogue: &'a [u8],
    pub closed: bool,
}

/// Split a multipart body on `--boundary` lines. `None` when no delimiter
/// line is present. The line break before each delimiter belongs to the
/// delimiter (RFC 2046 §5.1.1).
pub fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Option<MultipartSplit<'a>> {
    let dash = format!("--{boundary}");
    let dash = dash.as_bytes();

    let mut preamble: Option<&[u8]> = None;
    let mut part_start: Option<usize> = None;
    let mut parts = Vec::new();

    for (start, end) in line_spans(body) {
        let content = trim_eol(&body[start..end]);
        let Some(rest) = content.strip_prefix(dash) else {
            continue;
        };
        let (is_close, tail) = match rest.strip_prefix(b"--") {
            Some(tail) => (true, tail),
            None => (false, rest),
        };
        if !tail.iter().all(|b| *b == b' ' || *b == b'\t') {
            continue;
        }

        let cut = before_eol(body, start);
        match part_start {
            None => preamble = Some(&body[..cut]),
            Some(s) => parts.push(&body[s..cut.max(s)]),
        }
        if is_close {
            return Some(MultipartSplit {
                preamble: preamble.unwrap_or_default(),
                parts,
                epilogue: &body[end..],
                closed: true,
            });
        }
        part_start = Some(end);
    }

    let preamble = preamble?;
    if let Some(s) = part_start {
        parts.push(&body[s..]);
    }
    Some(MultipartSplit {
        preamble,
        parts,
        epilogue: &body[body.len()..],
        closed: false,
    })
}

fn before_eol(body: &[u8], line_start: usize) -> usize {
    if line_start >= 2 && &body[line_start - 2..line_start] == b"\r\n" {
        line_start - 2
    } else if line_start >= 1 && matches!(body[line_start - 1], b'\n' | b'\r') {
        line_start - 1
    } else {
        line_start
    }
}
