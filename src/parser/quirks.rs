//! Mail-client specific classification: status flags and detached
//! attachments.
//!
//! Status comes from whichever client wrote the mailbox: Mozilla status
//! bits, Gmail labels, or the generic `Status` / `X-Status` letters (and
//! the mbx flag word for Pine).

use super::header::first;
use super::mbox::MbxHeader;
use crate::model::message::{HeaderField, StatusFlag};

const MOZ_READ: u32 = 0x1;
const MOZ_REPLIED: u32 = 0x2;
const MOZ_MARKED: u32 = 0x4;
const MOZ_EXPUNGED: u32 = 0x8;
const MOZ2_NEW: u32 = 0x10000;
const MOZ2_IMAP_DELETED: u32 = 0x200000;

/// Which client produced the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mailer {
    Mozilla,
    Gmail,
    Pine,
    Generic,
}

pub fn detect_mailer(headers: &[HeaderField]) -> Mailer {
    if first(headers, "X-Mozilla-Status").is_some() {
        Mailer::Mozilla
    } else if first(headers, "X-Gmail-Labels").is_some() {
        Mailer::Gmail
    } else if first(headers, "X-X-Sender").is_some() {
        Mailer::Pine
    } else {
        Mailer::Generic
    }
}

/// Status flags of a message, sorted and without duplicates.
pub fn status_flags(headers: &[HeaderField], mbx: Option<&MbxHeader>) -> Vec<StatusFlag> {
    let mut flags = match detect_mailer(headers) {
        Mailer::Mozilla => mozilla_flags(headers),
        Mailer::Gmail => {
            let mut flags = gmail_flags(headers);
            // Labels carry no reply state.
            if generic_flags(headers, mbx).contains(&StatusFlag::Answered) {
                flags.push(StatusFlag::Answered);
            }
            flags
        }
        Mailer::Pine | Mailer::Generic => generic_flags(headers, mbx),
    };
    flags.sort();
    flags.dedup();
    flags
}

fn hex_header(headers: &[HeaderField], name: &str) -> Option<u32> {
    first(headers, name).and_then(|v| u32::from_str_radix(v.trim(), 16).ok())
}

fn mozilla_flags(headers: &[HeaderField]) -> Vec<StatusFlag> {
    let status = hex_header(headers, "X-Mozilla-Status");
    let status2 = hex_header(headers, "X-Mozilla-Status2").unwrap_or(0);
    let bits = status.unwrap_or(0);

    let mut flags = Vec::new();
    if bits & MOZ_READ != 0 {
        flags.push(StatusFlag::Seen);
    }
    if bits & MOZ_REPLIED != 0 {
        flags.push(StatusFlag::Answered);
    }
    if bits & MOZ_MARKED != 0 {
        flags.push(StatusFlag::Flagged);
    }
    if bits & MOZ_EXPUNGED != 0 || status2 & MOZ2_IMAP_DELETED != 0 {
        flags.push(StatusFlag::Deleted);
    }
    if first(headers, "X-Mozilla-Draft-Info").is_some() {
        flags.push(StatusFlag::Draft);
    }
    if status == Some(0) || status2 & MOZ2_NEW != 0 {
        flags.push(StatusFlag::Recent);
    }
    flags
}

/// Upper-cased, trimmed Gmail labels.
pub fn gmail_labels(headers: &[HeaderField]) -> Vec<String> {
    first(headers, "X-Gmail-Labels")
        .map(|v| {
            v.split(',')
                .map(|l| l.trim().to_uppercase())
                .filter(|l| !l.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn gmail_flags(headers: &[HeaderField]) -> Vec<StatusFlag> {
    let labels = gmail_labels(headers);
    let has = |l: &str| labels.iter().any(|x| x == l);

    let mut flags = Vec::new();
    if has("OPENED") {
        flags.push(StatusFlag::Seen);
    }
    if has("STARRED") {
        flags.push(StatusFlag::Flagged);
    }
    if has("TRASH") {
        flags.push(StatusFlag::Deleted);
    }
    if has("DRAFT") {
        flags.push(StatusFlag::Draft);
    }
    if has("UNREAD") && !["OPENED", "ARCHIVED", "TRASH", "SPAM"].iter().any(|l| has(l)) {
        flags.push(StatusFlag::Recent);
    }
    flags
}

fn generic_flags(headers: &[HeaderField], mbx: Option<&MbxHeader>) -> Vec<StatusFlag> {
    let status = first(headers, "Status");
    let letters = format!(
        "{}{}",
        status.unwrap_or(""),
        first(headers, "X-Status").unwrap_or("")
    );

    let mut flags = Vec::new();
    let mut set = |flag, mbx_bit: u16, letter: char| {
        let from_mbx = mbx.is_some_and(|m| m.has(mbx_bit));
        if from_mbx || letters.contains(letter) {
            flags.push(flag);
        }
    };
    set(StatusFlag::Seen, MbxHeader::SEEN, 'R');
    set(StatusFlag::Answered, MbxHeader::ANSWERED, 'A');
    set(StatusFlag::Flagged, MbxHeader::FLAGGED, 'F');
    set(StatusFlag::Deleted, MbxHeader::DELETED | MbxHeader::EXPUNGED, 'D');
    set(StatusFlag::Draft, MbxHeader::DRAFT, 'T');

    let recent = match mbx {
        Some(m) => !m.has(MbxHeader::OLD),
        None => status.is_some() && !letters.contains('O'),
    };
    if recent {
        flags.push(StatusFlag::Recent);
    }
    flags
}

/// Mozilla marks attachments removed from the mailbox with these headers.
pub fn is_mozilla_detached(headers: &[HeaderField]) -> bool {
    first(headers, "X-Mozilla-External-Attachment-URL").is_some()
        && first(headers, "X-Mozilla-Altered").is_some_and(|v| v.contains("AttachmentDetached"))
}
