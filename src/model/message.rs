//! One decomposed email and the small value types hanging off it.

use std::fmt;

use chrono::{DateTime, Utc};

use super::address::{AddressEntry, EmailAddress};
use super::body::Body;
use crate::digest::Digest;
use crate::report::Diagnostic;

/// A header field in source order. The value is unfolded and RFC 2047 decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

impl HeaderField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// End-of-line convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eol {
    Cr,
    Lf,
    CrLf,
}

impl Eol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cr => "CR",
            Self::Lf => "LF",
            Self::CrLf => "CRLF",
        }
    }

    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Cr => b"\r",
            Self::Lf => b"\n",
            Self::CrLf => b"\r\n",
        }
    }

    /// Terminator of a single line, if any.
    pub fn of_line(line: &[u8]) -> Option<Self> {
        if line.ends_with(b"\r\n") {
            Some(Self::CrLf)
        } else if line.ends_with(b"\n") {
            Some(Self::Lf)
        } else if line.ends_with(b"\r") {
            Some(Self::Cr)
        } else {
            None
        }
    }
}

impl fmt::Display for Eol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running tally of line terminators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EolCounts {
    pub cr: u64,
    pub lf: u64,
    pub crlf: u64,
}

impl EolCounts {
    pub fn add(&mut self, eol: Eol) {
        match eol {
            Eol::Cr => self.cr += 1,
            Eol::Lf => self.lf += 1,
            Eol::CrLf => self.crlf += 1,
        }
    }

    pub fn merge(&mut self, other: EolCounts) {
        self.cr += other.cr;
        self.lf += other.lf;
        self.crlf += other.crlf;
    }

    /// Most frequent terminator. Ties prefer CRLF, then LF.
    pub fn dominant(&self) -> Option<Eol> {
        let best = [(Eol::CrLf, self.crlf), (Eol::Lf, self.lf), (Eol::Cr, self.cr)]
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .fold(None::<(Eol, u64)>, |acc, cur| match acc {
                Some(a) if a.1 >= cur.1 => Some(a),
                _ => Some(cur),
            });
        best.map(|(eol, _)| eol)
    }

    /// More than one kind of terminator was seen.
    pub fn is_mixed(&self) -> bool {
        [self.cr, self.lf, self.crlf].iter().filter(|n| **n > 0).count() > 1
    }
}

/// Message status flags, in the order they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusFlag {
    Seen,
    Answered,
    Flagged,
    Deleted,
    Draft,
    Recent,
}

impl StatusFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seen => "Seen",
            Self::Answered => "Answered",
            Self::Flagged => "Flagged",
            Self::Deleted => "Deleted",
            Self::Draft => "Draft",
            Self::Recent => "Recent",
        }
    }
}

/// Marker for a message that could not be captured completely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incomplete {
    pub error_type: String,
    pub location: Option<String>,
}

impl Incomplete {
    pub fn new(error_type: impl Into<String>, location: Option<String>) -> Self {
        Self {
            error_type: error_type.into(),
            location,
        }
    }
}

/// Hash, size and line ending of the source bytes of a top-level message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageProperties {
    pub eol: Option<Eol>,
    pub hash: Digest,
    pub size: u64,
}

/// A decomposed message. Top-level messages carry [`MessageProperties`];
/// child messages (message/rfc822 parts) do not.
#[derive(Debug, Clone)]
pub struct Message {
    pub headers: Vec<HeaderField>,
    pub message_id: Option<String>,
    pub mime_version: Option<String>,
    pub orig_date: Option<DateTime<Utc>>,
    pub from: Vec<AddressEntry>,
    pub sender: Option<EmailAddress>,
    pub to: Vec<AddressEntry>,
    pub cc: Vec<AddressEntry>,
    pub bcc: Vec<AddressEntry>,
    pub in_reply_to: Vec<String>,
    pub references: Vec<String>,
    pub subject: Option<String>,
    pub comments: Vec<String>,
    pub keywords: Vec<String>,
    pub status_flags: Vec<StatusFlag>,
    pub body: Body,
    pub incomplete: Vec<Incomplete>,
    pub properties: Option<MessageProperties>,
    /// Problems found while segmenting or decomposing this message.
    pub diagnostics: Vec<Diagnostic>,
}

impl Message {
    /// First header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.is(name))
            .map(|h| h.value.as_str())
    }

    pub fn has_recipients(&self) -> bool {
        [&self.to, &self.cc, &self.bcc]
            .iter()
            .any(|list| list.iter().any(|e| e.mailboxes().next().is_some()))
    }

    pub fn is_incomplete(&self) -> bool {
        !self.incomplete.is_empty()
    }

    /// First mailbox of `From`, for summaries.
    pub fn first_from(&self) -> Option<&EmailAddress> {
        self.from.iter().flat_map(|e| e.mailboxes()).next()
    }
}
