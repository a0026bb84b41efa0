//! Integration tests for mbox segmentation, header decoding and MIME
//! decomposition.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use mbox2eaxs::digest::HashAlgorithm;
use mbox2eaxs::model::account::Account;
use mbox2eaxs::model::body::{Body, LeafContent};
use mbox2eaxs::model::message::Message;
use mbox2eaxs::parser::header::{decode_encoded_words, parse_date};
use mbox2eaxs::parser::mbox::{MboxSegmenter, MessageRecord, SegmentOutcome, MAX_MESSAGE_SIZE};
use mbox2eaxs::parser::mime;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn records(name: &str) -> (Vec<MessageRecord>, SegmentOutcome) {
    let file = File::open(fixture(name)).unwrap();
    let mut segmenter = MboxSegmenter::new(BufReader::new(file), MAX_MESSAGE_SIZE);
    let records = segmenter.by_ref().collect::<Result<Vec<_>, _>>().unwrap();
    (records, segmenter.outcome())
}

fn messages(name: &str) -> Vec<Message> {
    let account = Account::new("mailto:alice@example.com", "alice@example.com");
    records(name)
        .0
        .iter()
        .map(|r| mime::decompose(r, HashAlgorithm::Sha256, &account).unwrap())
        .collect()
}

fn leaf_text(body: &Body) -> String {
    let mut text = String::new();
    body.for_each_single(&mut |single| {
        if let LeafContent::Data(data) = &single.content {
            text.push_str(&String::from_utf8_lossy(data));
        }
    });
    text
}

// ─── Test 1: Segment simple.mbox → exactly 5 records ────────────────

#[test]
fn test_segment_simple_mbox_count() {
    let (records, outcome) = records("simple.mbox");
    assert_eq!(records.len(), 5);
    assert_eq!(outcome, SegmentOutcome::Delimited);
    let indices: Vec<u64> = records.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert!(records.windows(2).all(|w| w[0].end <= w[1].start));
}

// ─── Test 2: First message fields ───────────────────────────────────

#[test]
fn test_decompose_first_message() {
    let messages = messages("simple.mbox");
    let first = &messages[0];
    assert_eq!(first.message_id.as_deref(), Some("simple-1@example.com"));
    assert_eq!(first.subject.as_deref(), Some("Lunch on Friday"));
    assert_eq!(first.first_from().unwrap().address, "alice@example.com");
    assert_eq!(first.first_from().unwrap().display_name, "Alice Example");
    assert!(first.orig_date.is_some());
    assert!(first.diagnostics.is_empty(), "{:?}", first.diagnostics);
    assert!(first.properties.is_some());
}

// ─── Test 3: Encoded words and charsets ─────────────────────────────

#[test]
fn test_encoded_subject_and_latin1_body() {
    let messages = messages("simple.mbox");
    let third = &messages[2];
    assert_eq!(third.subject.as_deref(), Some("Café con leña"));
    // quoted-printable ISO-8859-1 is decoded to bytes, not yet to text
    let Body::Single(single) = &third.body else {
        panic!("expected a single body");
    };
    let LeafContent::Data(data) = &single.content else {
        panic!("expected data");
    };
    assert!(data.windows(5).any(|w| w == b"caf\xe9."), "{data:?}");
}

// ─── Test 4: >From in body is not a separator ───────────────────────

#[test]
fn test_from_escaping_in_body() {
    let messages = messages("simple.mbox");
    assert_eq!(messages.len(), 5, ">From must not split a message");
    let fourth = &messages[3];
    assert_eq!(fourth.subject.as_deref(), Some("Message with From in body"));
    let text = leaf_text(&fourth.body);
    assert!(
        text.contains("\nFrom the perspective"),
        "Body should contain the unmangled From line, got: '{text}'"
    );
}

// ─── Test 5: Replies and threading headers ──────────────────────────

#[test]
fn test_threading_headers() {
    let messages = messages("simple.mbox");
    let reply = &messages[1];
    assert_eq!(reply.in_reply_to, vec!["simple-1@example.com"]);
    assert_eq!(reply.references, vec!["simple-1@example.com"]);
    let to: Vec<_> = reply.to.iter().flat_map(|e| e.mailboxes()).collect();
    assert_eq!(to.len(), 2);
    assert_eq!(to[1].address, "carol@example.com");
}

// ─── Test 6: Multipart alternative ──────────────────────────────────

#[test]
fn test_multipart_alternative() {
    let messages = messages("simple.mbox");
    let Body::Multi(multi) = &messages[4].body else {
        panic!("expected a multipart body");
    };
    assert_eq!(multi.fields.boundary.as_deref(), Some("alt-5"));
    let types: Vec<_> = multi.parts.iter().map(|p| p.fields().mime_type().to_string()).collect();
    assert_eq!(types, vec!["text/plain", "text/html"]);
}

// ─── Test 7: Attachments decode from base64 ─────────────────────────

#[test]
fn test_attachment_payloads_are_decoded() {
    let messages = messages("two_attachments.mbox");
    let mut attachments = Vec::new();
    for message in &messages {
        message.body.for_each_single(&mut |single| {
            if single.fields.is_attachment() {
                if let LeafContent::Data(data) = &single.content {
                    attachments.push((single.fields.file_name().map(str::to_string), data.clone()));
                }
            }
        });
    }
    assert_eq!(attachments.len(), 2);
    assert_eq!(attachments[0].0.as_deref(), Some("report.pdf"));
    assert!(attachments[0].1.starts_with(b"%PDF-1.4"));
    assert!(attachments[1].1.starts_with(b"\x89PNG\r\n\x1a\n"));
}

// ─── Test 8: Phantom parts ──────────────────────────────────────────

#[test]
fn test_phantom_parts() {
    let messages = messages("phantom.mbox");
    let mut phantoms = Vec::new();
    messages[0].body.for_each_single(&mut |single| {
        phantoms.push(single.is_phantom());
    });
    assert_eq!(phantoms, vec![false, true, true]);
}

// ─── Test 9: No delimiter / empty input ─────────────────────────────

#[test]
fn test_no_delimiter_and_empty() {
    let (records, outcome) = records("no_delimiter.mbox");
    assert!(records.is_empty());
    assert_eq!(outcome, SegmentOutcome::NoDelimiter);

    let mut segmenter = MboxSegmenter::new(&b""[..], MAX_MESSAGE_SIZE);
    assert!(segmenter.next().is_none());
    assert_eq!(segmenter.outcome(), SegmentOutcome::Empty);
}

// ─── Test 10: Message hashes are stable and distinct ────────────────

#[test]
fn test_message_hashes() {
    let a = messages("simple.mbox");
    let b = messages("simple.mbox");
    let hashes: Vec<_> = a.iter().map(|m| m.properties.as_ref().unwrap().hash.to_hex()).collect();
    let again: Vec<_> = b.iter().map(|m| m.properties.as_ref().unwrap().hash.to_hex()).collect();
    assert_eq!(hashes, again);
    let mut unique = hashes.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);
}

// ─── Header helpers ─────────────────────────────────────────────────

#[test]
fn test_date_parsing_formats() {
    let zulu = parse_date("Thu, 04 Jan 2024 10:00:00 +0000").unwrap();
    assert_eq!(zulu.to_rfc3339(), "2024-01-04T10:00:00+00:00");
    let offset = parse_date("Fri, 05 Jan 2024 09:15:00 +0100").unwrap();
    assert_eq!(offset.to_rfc3339(), "2024-01-05T08:15:00+00:00");
    assert!(parse_date("not a date").is_none());
}

#[test]
fn test_decode_encoded_words_base64_utf8() {
    assert_eq!(decode_encoded_words("=?UTF-8?B?SG9sYSBtdW5kbw==?="), "Hola mundo");
}

#[test]
fn test_decode_encoded_words_q_iso8859() {
    assert_eq!(decode_encoded_words("=?ISO-8859-1?Q?Caf=E9?="), "Café");
}

#[test]
fn test_decode_encoded_words_plain_passthrough() {
    assert_eq!(decode_encoded_words("Hello World"), "Hello World");
}
