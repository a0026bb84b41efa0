//! Streaming mbox segmenter.
//!
//! Splits a byte stream into message records without loading the file into
//! memory. Two dialects are understood:
//!
//! - the classic `From `-delimited family (mboxo/mboxrd), tolerant of
//!   mixed `\n` / `\r\n` / `\r` line endings, a UTF-8 BOM, junk before the
//!   first delimiter and unescaped `From ` lines inside bodies;
//! - Pine/UW-IMAP `*mbx*`, where every record is preceded by a
//!   `date,size;KKKKKKKKFFFF-UUUUUUUU` line and spans exactly `size` bytes.
//!
//! Per-record problems become [`Diagnostic`]s and [`Incomplete`] markers on
//! the record; only I/O errors end the iteration.

use std::borrow::Cow;
use std::io::{self, BufRead, Read};

use tracing::debug;

use super::header::is_header_line;
use crate::digest::{hash_bytes, Digest, HashAlgorithm};
use crate::error::{ConvertError, Result};
use crate::model::message::{Eol, EolCounts, Incomplete};
use crate::report::Diagnostic;

/// Default maximum message size in bytes (256 MB).
pub const MAX_MESSAGE_SIZE: usize = 256 * 1024 * 1024;

const MBX_MAGIC: &[u8] = b"*mbx*";
const MBX_HEADER_SIZE: u64 = 2048;

pub const UNTERMINATED_PREVIOUS: &str =
    "Next delimiter not preceded by a blank line; message may be truncated";

/// Mailbox dialect of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    FromDelimited,
    Mbx,
}

/// How segmentation of a whole stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// Still iterating.
    Pending,
    /// Zero bytes of input.
    Empty,
    /// Input present but no delimiter (or mbx record header) was found.
    NoDelimiter,
    /// At least one record was produced.
    Delimited,
}

/// Pine mbx per-message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MbxHeader {
    pub date: String,
    pub size: u64,
    pub keywords: u32,
    pub flags: u16,
    pub uid: u32,
}

impl MbxHeader {
    pub const SEEN: u16 = 0x1;
    pub const DELETED: u16 = 0x2;
    pub const FLAGGED: u16 = 0x4;
    pub const ANSWERED: u16 = 0x8;
    pub const OLD: u16 = 0x10;
    pub const DRAFT: u16 = 0x20;
    pub const EXPUNGED: u16 = 0x8000;

    pub fn has(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    /// Parse `date,size;KKKKKKKKFFFF-UUUUUUUU\r\n`.
    pub fn parse(line: &[u8]) -> Option<Self> {
        let line = std::str::from_utf8(line.strip_suffix(b"\r\n")?).ok()?;
        let parts: Vec<&str> = line
            .split([',', ';'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        let [date, size, codes] = parts.as_slice() else {
            return None;
        };
        if codes.len() < 21 || codes.as_bytes()[12] != b'-' {
            return None;
        }
        Some(Self {
            date: date.to_string(),
            size: size.parse().ok()?,
            keywords: u32::from_str_radix(codes.get(0..8)?, 16).ok()?,
            flags: u16::from_str_radix(codes.get(8..12)?, 16).ok()?,
            uid: u32::from_str_radix(codes.get(13..21)?, 16).ok()?,
        })
    }
}

/// One delimited message.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    /// Zero-based position in the file.
    pub index: u64,
    /// Offset of the delimiter (or mbx record header) line.
    pub start: u64,
    /// Offset just past the last byte of the record.
    pub end: u64,
    /// The `From ` line, empty for mbx records.
    pub from_line: Vec<u8>,
    /// Header and body bytes, exactly as read.
    pub raw: Vec<u8>,
    pub eol: Option<Eol>,
    pub eol_counts: EolCounts,
    pub mbx: Option<MbxHeader>,
    pub incomplete: Vec<Incomplete>,
    pub diagnostics: Vec<Diagnostic>,
    pub dialect: Dialect,
}

impl MessageRecord {
    /// Raw bytes with one `>` removed from every `^>+From ` line.
    pub fn unmangled(&self) -> Cow<'_, [u8]> {
        if self.dialect == Dialect::Mbx || !contains_mangled_from(&self.raw) {
            return Cow::Borrowed(&self.raw);
        }
        let mut out = Vec::with_capacity(self.raw.len());
        for line in self.raw.split_inclusive(|b| *b == b'\n') {
            if is_mangled_from(line) {
                out.extend_from_slice(&line[1..]);
            } else {
                out.extend_from_slice(line);
            }
        }
        Cow::Owned(out)
    }

    /// Bytes covered by the message hash: the record without its delimiter
    /// line, trailing line ends trimmed and exactly one re-added.
    pub fn hash_input(&self) -> Cow<'_, [u8]> {
        let mut end = self.raw.len();
        while end > 0 && matches!(self.raw[end - 1], b'\n' | b'\r') {
            end -= 1;
        }
        if end == 0 {
            return Cow::Borrowed(&[]);
        }
        let mut bytes = self.raw[..end].to_vec();
        bytes.extend_from_slice(self.eol.unwrap_or(Eol::Lf).as_bytes());
        Cow::Owned(bytes)
    }

    /// Digest and size of [`MessageRecord::hash_input`].
    pub fn digest(&self, algorithm: HashAlgorithm) -> (Digest, u64) {
        let input = self.hash_input();
        (hash_bytes(algorithm, &input), input.len() as u64)
    }

    fn mark_incomplete(&mut self, reason: &str) {
        self.incomplete.push(Incomplete::new(
            reason,
            Some(format!("Byte offset {}", self.start)),
        ));
        self.diagnostics.push(Diagnostic::warning(format!(
            "Message at byte offset {}: {reason}",
            self.start
        )));
    }
}

/// Whole-stream results, available once iteration has finished.
#[derive(Debug, Clone)]
pub struct SegmentSummary {
    pub dialect: Dialect,
    pub outcome: SegmentOutcome,
    pub records: u64,
    pub bytes_read: u64,
    pub eol_counts: EolCounts,
    /// File-level diagnostics (leading junk, mixed line ends, overflow).
    pub diagnostics: Vec<Diagnostic>,
}

struct RecordBuilder {
    record: MessageRecord,
    truncated: bool,
    prev_blank: bool,
}

/// Lazy iterator over the records of one mailbox stream.
pub struct MboxSegmenter<R> {
    reader: R,
    max_message_size: usize,
    dialect: Option<Dialect>,
    offset: u64,
    records: u64,
    current: Option<RecordBuilder>,
    /// A `From ` line waiting for one line of look-ahead: (line, offset,
    /// previous line was blank).
    held: Option<(Vec<u8>, u64, bool)>,
    leading_junk: u64,
    first_line: bool,
    mbx_overflow: Vec<u8>,
    eol_counts: EolCounts,
    diagnostics: Vec<Diagnostic>,
    finished: bool,
    line: Vec<u8>,
}

impl<R: BufRead> MboxSegmenter<R> {
    pub fn new(reader: R, max_message_size: usize) -> Self {
        Self {
            reader,
            max_message_size,
            dialect: None,
            offset: 0,
            records: 0,
            current: None,
            held: None,
            leading_junk: 0,
            first_line: true,
            mbx_overflow: Vec::new(),
            eol_counts: EolCounts::default(),
            diagnostics: Vec::new(),
            finished: false,
            line: Vec::with_capacity(4096),
        }
    }

    /// Outcome so far; final once the iterator returned `None`.
    pub fn outcome(&self) -> SegmentOutcome {
        if !self.finished {
            SegmentOutcome::Pending
        } else if self.records > 0 {
            SegmentOutcome::Delimited
        } else if self.offset == 0 {
            SegmentOutcome::Empty
        } else {
            SegmentOutcome::NoDelimiter
        }
    }

    pub fn summary(&self) -> SegmentSummary {
        SegmentSummary {
            dialect: self.dialect.unwrap_or(Dialect::FromDelimited),
            outcome: self.outcome(),
            records: self.records,
            bytes_read: self.offset,
            eol_counts: self.eol_counts,
            diagnostics: self.diagnostics.clone(),
        }
    }

    /// Give back the underlying reader (e.g. to finish a hashing reader).
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn detect_dialect(&mut self) -> io::Result<Dialect> {
        let buf = self.reader.fill_buf()?;
        let dialect = if buf.starts_with(MBX_MAGIC) {
            Dialect::Mbx
        } else {
            Dialect::FromDelimited
        };
        debug!(?dialect, "Detected mailbox dialect");
        Ok(dialect)
    }

    /// Read one line ending in `\n`, `\r\n` or a lone `\r`.
    fn read_line(&mut self) -> io::Result<usize> {
        self.line.clear();
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(self.line.len());
            }
            let (done, used) = if self.line.last() == Some(&b'\r') {
                // A CR ended the previous chunk: only LF may complete it.
                (true, usize::from(buf[0] == b'\n'))
            } else {
                match buf.iter().position(|&b| b == b'\n' || b == b'\r') {
                    Some(i) if buf[i] == b'\n' => (true, i + 1),
                    Some(i) if i + 1 < buf.len() => {
                        (true, if buf[i + 1] == b'\n' { i + 2 } else { i + 1 })
                    }
                    Some(i) => (false, i + 1),
                    None => (false, buf.len()),
                }
            };
            self.line.extend_from_slice(&buf[..used]);
            self.reader.consume(used);
            if done {
                return Ok(self.line.len());
            }
        }
    }

    // ── From-delimited ──────────────────────────────────────────

    fn next_from_delimited(&mut self) -> Result<Option<MessageRecord>> {
        loop {
            let line_offset = self.offset;
            let n = self
                .read_line()
                .map_err(|e| ConvertError::ParseError {
                    offset: line_offset,
                    reason: e.to_string(),
                })?;

            if n == 0 {
                return Ok(self.finish_from_delimited());
            }
            self.offset += n as u64;
            let mut line = std::mem::take(&mut self.line);
            if self.first_line {
                if let Some(rest) = line.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
                    line = rest.to_vec();
                }
                self.first_line = false;
            }
            if let Some(eol) = Eol::of_line(&line) {
                self.eol_counts.add(eol);
            }

            let mut finished = None;
            if let Some((held, held_offset, blank_before)) = self.held.take() {
                if is_header_line(&line) {
                    finished = self.start_record(held, held_offset, blank_before);
                } else {
                    self.push_body_from_line(held, held_offset);
                }
            }

            if line.starts_with(b"From ") {
                let blank_before = self.current.as_ref().is_none_or(|c| c.prev_blank);
                self.held = Some((line.clone(), line_offset, blank_before));
            } else {
                self.push_line(&line);
            }
            self.line = line;

            if finished.is_some() {
                return Ok(finished);
            }
        }
    }

    /// A held `From ` line turned out to be a delimiter.
    fn start_record(
        &mut self,
        from_line: Vec<u8>,
        offset: u64,
        blank_before: bool,
    ) -> Option<MessageRecord> {
        let previous = self.current.take().map(|builder| {
            let mut record = self.seal(builder);
            if !blank_before {
                record.mark_incomplete(UNTERMINATED_PREVIOUS);
            }
            record
        });

        if previous.is_none() && self.leading_junk > 0 {
            self.diagnostics.push(Diagnostic::warning(format!(
                "Skipped {} bytes before the first 'From ' delimiter",
                self.leading_junk
            )));
        }

        let index = self.records + u64::from(previous.is_some());
        self.current = Some(RecordBuilder {
            record: MessageRecord {
                index,
                start: offset,
                end: offset + from_line.len() as u64,
                from_line,
                raw: Vec::with_capacity(16 * 1024),
                eol: None,
                eol_counts: EolCounts::default(),
                mbx: None,
                incomplete: Vec::new(),
                diagnostics: Vec::new(),
                dialect: Dialect::FromDelimited,
            },
            truncated: false,
            prev_blank: false,
        });
        if previous.is_some() {
            self.records += 1;
        }
        previous
    }

    /// A held `From ` line was not followed by a header: it is body text.
    fn push_body_from_line(&mut self, line: Vec<u8>, offset: u64) {
        if let Some(builder) = self.current.as_mut() {
            builder.record.diagnostics.push(Diagnostic::warning(format!(
                "Unescaped 'From ' line at byte offset {offset} treated as message content"
            )));
        }
        self.push_line(&line);
    }

    fn push_line(&mut self, line: &[u8]) {
        let Some(builder) = self.current.as_mut() else {
            self.leading_junk += line.len() as u64;
            return;
        };
        let record = &mut builder.record;
        record.end += line.len() as u64;
        if let Some(eol) = Eol::of_line(line) {
            record.eol_counts.add(eol);
        }
        builder.prev_blank = is_blank_line(line);

        if builder.truncated {
            return;
        }
        if record.raw.len() + line.len() <= self.max_message_size {
            record.raw.extend_from_slice(line);
        } else {
            builder.truncated = true;
        }
    }

    fn seal(&self, builder: RecordBuilder) -> MessageRecord {
        let mut record = builder.record;
        record.eol = record.eol_counts.dominant();
        if builder.truncated {
            record.mark_incomplete(&format!(
                "Message exceeds the maximum size of {} bytes and was truncated",
                self.max_message_size
            ));
        }
        record
    }

    fn finish_from_delimited(&mut self) -> Option<MessageRecord> {
        if let Some((held, offset, _)) = self.held.take() {
            self.push_body_from_line(held, offset);
        }
        if self.eol_counts.is_mixed() {
            self.diagnostics.push(Diagnostic::warning(format!(
                "Mixed line endings in file (CR: {}, LF: {}, CRLF: {})",
                self.eol_counts.cr, self.eol_counts.lf, self.eol_counts.crlf
            )));
        }
        self.finished = true;
        let builder = self.current.take()?;
        self.records += 1;
        Some(self.seal(builder))
    }

    // ── mbx ─────────────────────────────────────────────────────

    fn next_mbx(&mut self) -> Result<Option<MessageRecord>> {
        if self.offset == 0 {
            let skipped = io::copy(
                &mut (&mut self.reader).take(MBX_HEADER_SIZE),
                &mut io::sink(),
            )
            .map_err(|e| ConvertError::ParseError {
                offset: 0,
                reason: e.to_string(),
            })?;
            self.offset = skipped;
            if skipped < MBX_HEADER_SIZE {
                self.diagnostics.push(Diagnostic::warning(
                    "The mbx file header is shorter than 2048 bytes",
                ));
            }
        }

        loop {
            let header_offset = self.offset;
            let n = self.read_line().map_err(|e| ConvertError::ParseError {
                offset: header_offset,
                reason: e.to_string(),
            })?;
            if n == 0 {
                self.finish_mbx();
                return Ok(None);
            }
            self.offset += n as u64;

            let Some(header) = MbxHeader::parse(&self.line) else {
                // Resynchronise on the next line.
                self.mbx_overflow.extend_from_slice(&self.line);
                continue;
            };

            let wanted = header.size.min(self.max_message_size as u64);
            let mut raw = Vec::with_capacity(wanted as usize);
            (&mut self.reader)
                .take(wanted)
                .read_to_end(&mut raw)
                .map_err(|e| ConvertError::ParseError {
                    offset: self.offset,
                    reason: e.to_string(),
                })?;
            let mut consumed = raw.len() as u64;
            if header.size > wanted {
                consumed += io::copy(
                    &mut (&mut self.reader).take(header.size - wanted),
                    &mut io::sink(),
                )
                .map_err(|e| ConvertError::ParseError {
                    offset: self.offset,
                    reason: e.to_string(),
                })?;
            }
            self.offset += consumed;

            let mut eol_counts = EolCounts::default();
            for line in raw.split_inclusive(|b| *b == b'\n') {
                if let Some(eol) = Eol::of_line(line) {
                    eol_counts.add(eol);
                }
            }
            self.eol_counts.merge(eol_counts);

            let mut record = MessageRecord {
                index: self.records,
                start: header_offset,
                end: self.offset,
                from_line: Vec::new(),
                raw,
                eol: eol_counts.dominant(),
                eol_counts,
                mbx: Some(header.clone()),
                incomplete: Vec::new(),
                diagnostics: Vec::new(),
                dialect: Dialect::Mbx,
            };
            if !self.mbx_overflow.is_empty() {
                record.diagnostics.push(overflow_warning(&self.mbx_overflow));
                self.mbx_overflow.clear();
            }
            if consumed < header.size {
                record.mark_incomplete("End of file reached before the declared message size");
            } else if header.size > wanted {
                record.mark_incomplete(&format!(
                    "Message exceeds the maximum size of {} bytes and was truncated",
                    self.max_message_size
                ));
            }
            self.records += 1;
            return Ok(Some(record));
        }
    }

    fn finish_mbx(&mut self) {
        if !self.mbx_overflow.is_empty() {
            self.diagnostics.push(overflow_warning(&self.mbx_overflow));
            self.mbx_overflow.clear();
        }
        self.finished = true;
    }
}

fn overflow_warning(overflow: &[u8]) -> Diagnostic {
    let text = String::from_utf8_lossy(overflow);
    let excerpt: String = text.chars().take(80).collect();
    Diagnostic::warning(format!(
        "Skipped {} bytes of unparseable mbx data: '{}'",
        overflow.len(),
        excerpt.trim_end()
    ))
}

impl<R: BufRead> Iterator for MboxSegmenter<R> {
    type Item = Result<MessageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let dialect = match self.dialect {
            Some(d) => d,
            None => match self.detect_dialect() {
                Ok(d) => {
                    self.dialect = Some(d);
                    d
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(ConvertError::ParseError {
                        offset: 0,
                        reason: e.to_string(),
                    }));
                }
            },
        };
        let result = match dialect {
            Dialect::FromDelimited => self.next_from_delimited(),
            Dialect::Mbx => self.next_mbx(),
        };
        match result {
            Ok(record) => record.map(Ok),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Whether a line is blank (empty or only whitespace / CR / LF).
fn is_blank_line(line: &[u8]) -> bool {
    line.iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b' ' || b == b'\t')
}

/// `^>+From `
fn is_mangled_from(line: &[u8]) -> bool {
    let quotes = line.iter().take_while(|&&b| b == b'>').count();
    quotes > 0 && line[quotes..].starts_with(b"From ")
}

fn contains_mangled_from(raw: &[u8]) -> bool {
    raw.split(|b| *b == b'\n').any(is_mangled_from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(data: &[u8]) -> (Vec<MessageRecord>, SegmentSummary) {
        let mut seg = MboxSegmenter::new(data, MAX_MESSAGE_SIZE);
        let records: Vec<MessageRecord> = seg.by_ref().map(|r| r.unwrap()).collect();
        (records, seg.summary())
    }

    #[test]
    fn test_two_messages() {
        let data = b"From a@b Thu Jan 01 00:00:00 2024\nSubject: one\n\nbody one\n\n\
From c@d Thu Jan 01 00:00:00 2024\nSubject: two\n\nbody two\n";
        let (records, summary) = segment(data);
        assert_eq!(records.len(), 2);
        assert_eq!(summary.outcome, SegmentOutcome::Delimited);
        assert!(records[0].raw.starts_with(b"Subject: one"));
        assert!(records[0].incomplete.is_empty());
        assert_eq!(records[1].index, 1);
        assert_eq!(records[1].start, records[0].end);
        assert_eq!(records[1].end, data.len() as u64);
        assert_eq!(records[0].eol, Some(Eol::Lf));
    }

    #[test]
    fn test_from_in_body_is_content() {
        let data = b"From a@b Thu Jan 01 00:00:00 2024\nSubject: one\n\n\
From the desk of someone\nmore text\n";
        let (records, _) = segment(data);
        assert_eq!(records.len(), 1);
        assert!(records[0].raw.ends_with(b"From the desk of someone\nmore text\n"));
        assert_eq!(records[0].diagnostics.len(), 1);
    }

    #[test]
    fn test_delimiter_without_blank_line_marks_previous() {
        let data = b"From a@b Thu Jan 01 00:00:00 2024\nSubject: one\n\nbody\n\
From c@d Thu Jan 01 00:00:00 2024\nSubject: two\n\nbody\n";
        let (records, _) = segment(data);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].incomplete.len(), 1);
        assert_eq!(records[0].incomplete[0].error_type, UNTERMINATED_PREVIOUS);
        assert!(records[1].incomplete.is_empty());
    }

    #[test]
    fn test_no_delimiter() {
        let (records, summary) = segment(b"Subject: not an mbox\n\nhello\n");
        assert!(records.is_empty());
        assert_eq!(summary.outcome, SegmentOutcome::NoDelimiter);

        let (_, empty) = segment(b"");
        assert_eq!(empty.outcome, SegmentOutcome::Empty);
    }

    #[test]
    fn test_leading_junk_and_bom() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"garbage\nFrom a@b Thu Jan 01 00:00:00 2024\nSubject: x\n\nb\n");
        let (records, summary) = segment(&data);
        assert_eq!(records.len(), 1);
        assert_eq!(summary.diagnostics.len(), 1);
        assert!(summary.diagnostics[0].message.contains("Skipped 8 bytes"));
    }

    #[test]
    fn test_crlf_and_mixed_warning() {
        let data = b"From a@b Thu Jan 01 00:00:00 2024\r\nSubject: x\r\n\r\nbody\n";
        let (records, summary) = segment(data);
        assert_eq!(records[0].eol, Some(Eol::CrLf));
        assert!(summary.eol_counts.is_mixed());
        assert_eq!(summary.diagnostics.len(), 1);
    }

    #[test]
    fn test_cr_only_lines() {
        let data = b"From a@b Thu Jan 01 00:00:00 2024\rSubject: x\r\rbody\r";
        let (records, _) = segment(data);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].eol, Some(Eol::Cr));
        assert_eq!(records[0].raw, b"Subject: x\r\rbody\r");
    }

    #[test]
    fn test_truncation() {
        let data = b"From a@b Thu Jan 01 00:00:00 2024\nSubject: x\n\n0123456789\n0123456789\n";
        let mut seg = MboxSegmenter::new(&data[..], 20);
        let record = seg.next().unwrap().unwrap();
        assert!(record.raw.len() <= 20);
        assert_eq!(record.incomplete.len(), 1);
        assert_eq!(record.end, data.len() as u64);
    }

    #[test]
    fn test_unmangle_and_hash_input() {
        let data = b"From a@b Thu Jan 01 00:00:00 2024\nSubject: x\n\n>From here\n>>From there\n\n\n";
        let (records, _) = segment(data);
        let unmangled = records[0].unmangled();
        assert_eq!(&unmangled[..], b"Subject: x\n\nFrom here\n>From there\n\n\n");
        assert_eq!(
            &records[0].hash_input()[..],
            b"Subject: x\n\n>From here\n>>From there\n"
        );
    }

    #[test]
    fn test_mbx_header_parse() {
        let header =
            MbxHeader::parse(b" 3-Jan-2003 09:59:23 -0500,12;000000010029-0000000A\r\n").unwrap();
        assert_eq!(header.size, 12);
        assert_eq!(header.keywords, 1);
        assert!(header.has(MbxHeader::SEEN));
        assert!(header.has(MbxHeader::ANSWERED));
        assert!(header.has(MbxHeader::DRAFT));
        assert!(!header.has(MbxHeader::DELETED));
        assert_eq!(header.uid, 10);
        assert!(MbxHeader::parse(b"garbage\r\n").is_none());
        assert!(MbxHeader::parse(b" 3-Jan-2003 09:59:23 -0500,12;000000010029-0000000A\n").is_none());
    }

    #[test]
    fn test_mbx_records_and_resync() {
        let mut data = b"*mbx*\r\n".to_vec();
        data.resize(2048, b' ');
        let msg1 = b"Subject: a\r\n\r\nhi\r\n";
        data.extend_from_slice(
            format!(" 3-Jan-2003 09:59:23 -0500,{};000000000001-00000001\r\n", msg1.len()).as_bytes(),
        );
        data.extend_from_slice(msg1);
        data.extend_from_slice(b"junk line\r\n");
        let msg2 = b"Subject: b\r\n\r\nyo\r\n";
        data.extend_from_slice(
            format!(" 4-Jan-2003 09:59:23 -0500,{};000000000000-00000002\r\n", msg2.len()).as_bytes(),
        );
        data.extend_from_slice(msg2);

        let (records, summary) = segment(&data);
        assert_eq!(summary.dialect, Dialect::Mbx);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].raw, msg1);
        assert!(records[0].mbx.as_ref().unwrap().has(MbxHeader::SEEN));
        assert_eq!(records[1].raw, msg2);
        assert_eq!(records[1].diagnostics.len(), 1);
        assert!(records[1].diagnostics[0].message.contains("junk line"));
        assert_eq!(summary.outcome, SegmentOutcome::Delimited);
    }

    #[test]
    fn test_is_blank_line() {
        assert!(is_blank_line(b"\n"));
        assert!(is_blank_line(b"\r\n"));
        assert!(is_blank_line(b"  \n"));
        assert!(!is_blank_line(b"hello\n"));
    }
}
