//! Header block parsing: unfolding, RFC 2047 encoded words, structured
//! parameters (RFC 2045 / RFC 2231) and dates.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::model::body::Param;
use crate::model::message::HeaderField;
use crate::report::Diagnostic;

/// Decode raw header bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
pub fn decode_header_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// An entity split at the end of its header block.
#[derive(Debug, Clone, Copy)]
pub struct Split<'a> {
    pub headers: &'a [u8],
    pub body: &'a [u8],
    /// The header block ended at a non-header line instead of a blank line.
    pub missing_separator: bool,
}

/// Split an entity into header block and body.
///
/// The block ends at the first empty line. A line that is neither a header
/// field nor a continuation also ends it; that line then belongs to the body.
pub fn split_header_body(raw: &[u8]) -> Split<'_> {
    for (start, end) in line_spans(raw) {
        let line = &raw[start..end];
        if trim_eol(line).is_empty() {
            return Split {
                headers: &raw[..start],
                body: &raw[end..],
                missing_separator: false,
            };
        }
        let continuation = start > 0 && matches!(line.first(), Some(b' ' | b'\t'));
        if !continuation && !is_header_line(line) {
            return Split {
                headers: &raw[..start],
                body: &raw[start..],
                missing_separator: true,
            };
        }
    }
    Split {
        headers: raw,
        body: &raw[raw.len()..],
        missing_separator: false,
    }
}

/// Byte ranges of the lines of `data`, terminators (`\n`, `\r\n` or a
/// lone `\r`) included.
pub(crate) fn line_spans(data: &[u8]) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= data.len() {
            return None;
        }
        let start = pos;
        let mut i = pos;
        while i < data.len() {
            match data[i] {
                b'\n' => {
                    i += 1;
                    break;
                }
                b'\r' => {
                    i += if data.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                    break;
                }
                _ => i += 1,
            }
        }
        pos = i;
        Some((start, i))
    })
}

/// `field-name ":"`, where a field name is printable US-ASCII without `:`.
pub fn is_header_line(line: &[u8]) -> bool {
    let line = trim_eol(line);
    match line.iter().position(|&b| b == b':') {
        Some(0) | None => false,
        Some(colon) => line[..colon]
            .trim_ascii_end()
            .iter()
            .all(|&b| (33..=126).contains(&b)),
    }
}

pub(crate) fn trim_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Unfolded header fields plus the lines that were not fields.
#[derive(Debug, Clone, Default)]
pub struct HeaderBlock {
    pub fields: Vec<HeaderField>,
    pub malformed_lines: Vec<String>,
}

/// Unfold a header block. Values are raw (encoded words are not decoded).
pub fn parse_header_block(raw: &[u8]) -> HeaderBlock {
    let text = decode_header_bytes(raw);
    let mut block = HeaderBlock::default();

    let lines = text
        .split('\n')
        .flat_map(|l| l.strip_suffix('\r').unwrap_or(l).split('\r'));
    for line in lines {
        if line.starts_with(' ') || line.starts_with('\t') {
            match block.fields.last_mut() {
                Some(last) => {
                    if !last.value.is_empty() {
                        last.value.push(' ');
                    }
                    last.value.push_str(line.trim());
                }
                None => block.malformed_lines.push(line.to_string()),
            }
        } else if let Some(colon) = line.find(':').filter(|c| *c > 0) {
            block.fields.push(HeaderField::new(
                line[..colon].trim_end(),
                line[colon + 1..].trim(),
            ));
        } else if !line.trim().is_empty() {
            block.malformed_lines.push(line.to_string());
        }
    }
    block
}

/// First value for a header name (case-insensitive).
pub fn first<'a>(fields: &'a [HeaderField], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|f| f.is(name))
        .map(|f| f.value.as_str())
}

// ── RFC 2047 ────────────────────────────────────────────────────

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
pub fn decode_encoded_words(input: &str) -> String {
    decode_encoded_words_checked(input).0
}

/// Like [`decode_encoded_words`], also reporting unknown charsets and
/// malformed words (which are kept as literal text).
pub fn decode_encoded_words_checked(input: &str) -> (String, Vec<Diagnostic>) {
    let mut result = String::with_capacity(input.len());
    let mut diagnostics = Vec::new();
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        // Whitespace between two encoded words is dropped (RFC 2047 §6.2)
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_start = &remaining[start + 2..];
        match try_decode_one_word(after_start) {
            Some(word) => {
                if !word.known_charset {
                    diagnostics.push(Diagnostic::warning(format!(
                        "Unknown charset '{}' in encoded word; decoded as UTF-8",
                        word.charset
                    )));
                }
                result.push_str(&word.text);
                remaining = &after_start[word.consumed..];
                last_was_encoded = true;
            }
            None => {
                if looks_like_encoded_word(after_start) {
                    diagnostics.push(Diagnostic::warning(format!(
                        "Malformed encoded word kept as literal text in '{input}'"
                    )));
                }
                result.push_str("=?");
                remaining = after_start;
                last_was_encoded = false;
            }
        }
    }

    result.push_str(remaining);
    (result, diagnostics)
}

struct DecodedWord {
    text: String,
    charset: String,
    known_charset: bool,
    /// Bytes consumed after the initial `=?`.
    consumed: usize,
}

fn try_decode_one_word(s: &str) -> Option<DecodedWord> {
    // charset?encoding?encoded_text?=
    let first_q = s.find('?')?;
    let charset = &s[..first_q];
    if charset.is_empty() || charset.contains(char::is_whitespace) {
        return None;
    }

    let rest = &s[first_q + 1..];
    let second_q = rest.find('?')?;
    let encoding = &rest[..second_q];

    let rest2 = &rest[second_q + 1..];
    let end = rest2.find("?=")?;
    let encoded_text = &rest2[..end];

    let bytes = match encoding {
        "B" | "b" => crate::encoding::transfer::decode_base64_lenient(encoded_text.as_bytes())?,
        "Q" | "q" => decode_q_encoding(encoded_text),
        _ => return None,
    };

    // RFC 2231 §5 allows a language suffix: "utf-8*en".
    let charset = charset.split('*').next().unwrap_or(charset);
    let (text, known_charset) = decode_charset(charset, &bytes);

    Some(DecodedWord {
        text,
        charset: charset.to_string(),
        known_charset,
        consumed: first_q + 1 + second_q + 1 + end + 2,
    })
}

fn looks_like_encoded_word(s: &str) -> bool {
    let head = s.split(char::is_whitespace).next().unwrap_or("");
    head.matches('?').count() >= 3 && head.contains("?=")
}

/// Decode Q-encoding (RFC 2047): underscores → spaces, `=XX` → byte.
fn decode_q_encoding(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' => match hex_pair(bytes.get(i + 1).copied(), bytes.get(i + 2).copied()) {
                Some(byte) => {
                    result.push(byte);
                    i += 3;
                }
                None => {
                    result.push(b'=');
                    i += 1;
                }
            },
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    result
}

fn hex_pair(hi: Option<u8>, lo: Option<u8>) -> Option<u8> {
    let hi = (hi? as char).to_digit(16)?;
    let lo = (lo? as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

/// Decode bytes using a named charset. The flag is false when the charset
/// is unknown and UTF-8 (lossy) was used instead.
pub fn decode_charset(charset: &str, bytes: &[u8]) -> (String, bool) {
    let label = charset.trim().trim_matches('"');
    if label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8") {
        return (String::from_utf8_lossy(bytes).into_owned(), true);
    }
    match encoding_rs::Encoding::for_label(label.as_bytes()) {
        Some(encoding) => {
            let (decoded, _, _) = encoding.decode(bytes);
            (decoded.into_owned(), true)
        }
        None => (String::from_utf8_lossy(bytes).into_owned(), false),
    }
}

// ── Structured values ───────────────────────────────────────────

/// A `value; name=param; ...` header, e.g. Content-Type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredValue {
    /// Lower-cased leading value.
    pub value: String,
    /// Parameters with lower-cased names, in order of first appearance,
    /// RFC 2231 continuations joined and decoded.
    pub params: Vec<Param>,
}

impl StructuredValue {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// Parse a structured header value with its parameters.
pub fn parse_structured(raw: &str) -> StructuredValue {
    let mut segments = split_unquoted(raw, ';').into_iter();
    let value = segments
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    // (base name, section, extended, value)
    let mut pieces: Vec<(String, Option<u32>, bool, String)> = Vec::new();
    for segment in segments {
        let Some(eq) = segment.find('=') else {
            continue;
        };
        let mut name = segment[..eq].trim().to_ascii_lowercase();
        if name.is_empty() {
            continue;
        }
        let value = unquote(segment[eq + 1..].trim());

        let extended = name.ends_with('*');
        if extended {
            name.pop();
        }
        let mut section = None;
        if let Some(star) = name.rfind('*') {
            if let Ok(n) = name[star + 1..].parse::<u32>() {
                section = Some(n);
                name.truncate(star);
            }
        }
        pieces.push((name, section, extended, value));
    }

    let mut order: Vec<String> = Vec::new();
    for (name, ..) in &pieces {
        if !order.contains(name) {
            order.push(name.clone());
        }
    }

    let params = order
        .into_iter()
        .map(|name| {
            let mut parts: Vec<&(String, Option<u32>, bool, String)> =
                pieces.iter().filter(|p| p.0 == name).collect();
            parts.sort_by_key(|p| p.1.unwrap_or(0));
            let value = join_rfc2231(&parts);
            Param::new(name, value)
        })
        .collect();

    StructuredValue { value, params }
}

fn join_rfc2231(parts: &[&(String, Option<u32>, bool, String)]) -> String {
    let Some(first) = parts.first() else {
        return String::new();
    };

    if !parts.iter().any(|p| p.2) {
        let joined: String = parts.iter().map(|p| p.3.as_str()).collect();
        return decode_encoded_words(&joined);
    }

    // charset'language'percent-encoded on the first extended segment.
    let mut charset = "us-ascii".to_string();
    let mut bytes = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let mut value = part.3.as_str();
        if i == 0 && first.2 {
            let mut fields = value.splitn(3, '\'');
            if let (Some(cs), Some(_lang), Some(rest)) = (fields.next(), fields.next(), fields.next()) {
                if !cs.is_empty() {
                    charset = cs.to_string();
                }
                value = rest;
            }
        }
        if part.2 {
            bytes.extend(percent_decode(value));
        } else {
            bytes.extend_from_slice(value.as_bytes());
        }
    }
    decode_charset(&charset, &bytes).0
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(b) = hex_pair(bytes.get(i + 1).copied(), bytes.get(i + 2).copied()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Split on `sep` outside double quotes.
fn split_unquoted(s: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    for ch in s.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => {
                current.push(ch);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            c if c == sep && !in_quotes => out.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    out.push(current);
    out
}

fn unquote(s: &str) -> String {
    let Some(inner) = s.strip_prefix('"') else {
        return s.to_string();
    };
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

// ── Message-ID lists ────────────────────────────────────────────

/// Content between `<` and `>` (Message-ID, Content-ID), brackets removed.
pub fn extract_angle_bracket(s: &str) -> String {
    let trimmed = s.trim();
    if let Some(start) = trimmed.find('<') {
        if let Some(end) = trimmed[start..].find('>') {
            return trimmed[start + 1..start + end].trim().to_string();
        }
    }
    trimmed.to_string()
}

/// All `<…>` tokens of a References / In-Reply-To value, brackets removed.
pub fn extract_all_angle_brackets(s: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut remaining = s;
    while let Some(start) = remaining.find('<') {
        match remaining[start..].find('>') {
            Some(end) => {
                let id = remaining[start + 1..start + end].trim();
                if !id.is_empty() {
                    result.push(id.to_string());
                }
                remaining = &remaining[start + end + 1..];
            }
            None => break,
        }
    }
    result
}

// ── Dates ───────────────────────────────────────────────────────

/// Parse an email date string in various common formats.
///
/// Supports RFC 2822, ISO 8601, and many broken real-world variants.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    // Trailing comments such as "(PST)" are not part of the date.
    let uncommented = match trimmed.find('(') {
        Some(pos) => trimmed[..pos].trim(),
        None => trimmed,
    };
    let no_dow = strip_day_of_week(uncommented);
    let imap = normalize_imap_date(&no_dow);

    const FORMATS: [&str; 10] = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M %z",
        "%d %b %Y %H:%M:%S",
        "%b %d %H:%M:%S %Y",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];

    for candidate in [no_dow.clone(), imap.clone(), replace_named_tz(&no_dow), replace_named_tz(&imap)] {
        for fmt in FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(&candidate, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(&candidate, fmt) {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
    }

    mail_parser_date(trimmed)
}

/// Last resort: `mail-parser`'s own date parser.
fn mail_parser_date(input: &str) -> Option<DateTime<Utc>> {
    let fake_msg = format!("Date: {input}\n\n");
    let parsed = mail_parser::MessageParser::default().parse(fake_msg.as_bytes())?;
    let rfc3339 = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&rfc3339)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// `"16-JUL-2025 03:01:03"` → `"16 Jul 2025 03:01:03"`.
fn normalize_imap_date(s: &str) -> String {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    if !s.contains('-') {
        return s.to_string();
    }
    for month in MONTHS {
        for variant in [month.to_ascii_uppercase(), month.to_ascii_lowercase(), month.to_string()] {
            let pattern = format!("-{variant}-");
            if s.contains(&pattern) {
                return s.replacen(&pattern, &format!(" {month} "), 1);
            }
        }
    }
    s.to_string()
}

/// Strip a leading day-of-week ("Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> String {
    const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    for day in DAYS {
        if let Some(rest) = s.strip_prefix(day) {
            if rest.starts_with(',') || rest.starts_with(' ') {
                return rest.trim_start_matches(',').trim().to_string();
            }
        }
    }
    s.to_string()
}

/// Replace a trailing timezone abbreviation with its numeric offset.
fn replace_named_tz(s: &str) -> String {
    const ZONES: [(&str, &str); 14] = [
        ("CEST", "+0200"),
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("UT", "+0000"),
        ("CET", "+0100"),
        ("JST", "+0900"),
    ];
    for (name, offset) in ZONES {
        if let Some(head) = s.strip_suffix(name) {
            if head.ends_with(' ') {
                return format!("{head}{offset}");
            }
        }
    }
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_encoded_word() {
        assert_eq!(decode_encoded_words("=?UTF-8?B?SG9sYSBtdW5kbw==?="), "Hola mundo");
    }

    #[test]
    fn test_decode_q_encoded_word() {
        assert_eq!(decode_encoded_words("=?ISO-8859-1?Q?caf=E9?="), "café");
    }

    #[test]
    fn test_decode_multiple_encoded_words() {
        let input = "=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?=";
        assert_eq!(decode_encoded_words(input), "Hola mundo");
    }

    #[test]
    fn test_decode_mixed_plain_and_encoded() {
        let input = "Re: =?UTF-8?B?SG9sYQ==?= there";
        assert_eq!(decode_encoded_words(input), "Re: Hola there");
    }

    #[test]
    fn test_decode_windows1252_encoded_word() {
        assert_eq!(decode_encoded_words("=?Windows-1252?Q?M=FCller?="), "Müller");
    }

    #[test]
    fn test_decode_utf8_base64_japanese() {
        // 山田太郎
        assert_eq!(decode_encoded_words("=?UTF-8?B?5bGx55Sw5aSq6YOO?="), "山田太郎");
    }

    #[test]
    fn test_unknown_charset_warns() {
        let (text, diags) = decode_encoded_words_checked("=?x-klingon?Q?abc?=");
        assert_eq!(text, "abc");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("x-klingon"));
    }

    #[test]
    fn test_malformed_word_kept_literal() {
        let (text, diags) = decode_encoded_words_checked("=?utf-8?X?abc?=");
        assert_eq!(text, "=?utf-8?X?abc?=");
        assert_eq!(diags.len(), 1);
        let (plain, none) = decode_encoded_words_checked("a =? b");
        assert_eq!(plain, "a =? b");
        assert!(none.is_empty());
    }

    #[test]
    fn test_parse_header_block_unfolds() {
        let raw = b"Subject: This is a long\r\n\tsubject line\r\nFrom: user@example.com\r\nnot a header\r\n";
        let block = parse_header_block(raw);
        assert_eq!(block.fields.len(), 2);
        assert_eq!(block.fields[0].name, "Subject");
        assert_eq!(block.fields[0].value, "This is a long subject line");
        assert_eq!(block.malformed_lines, vec!["not a header"]);
    }

    #[test]
    fn test_split_header_body() {
        let split = split_header_body(b"A: 1\r\nB: 2\r\n\r\nbody\r\n");
        assert_eq!(split.headers, b"A: 1\r\nB: 2\r\n");
        assert_eq!(split.body, b"body\r\n");
        assert!(!split.missing_separator);

        let no_blank = split_header_body(b"A: 1\nplain text\n");
        assert_eq!(no_blank.headers, b"A: 1\n");
        assert_eq!(no_blank.body, b"plain text\n");
        assert!(no_blank.missing_separator);

        let headerless = split_header_body(b"\nonly body\n");
        assert!(headerless.headers.is_empty());
        assert_eq!(headerless.body, b"only body\n");
    }

    #[test]
    fn test_is_header_line() {
        assert!(is_header_line(b"Return-Path: <a@b>\n"));
        assert!(is_header_line(b"X-Empty:\r\n"));
        assert!(!is_header_line(b"From a@b Thu Jan 01 00:00:00 2024\n"));
        assert!(!is_header_line(b"hello world: this is prose\n"));
        assert!(!is_header_line(b": no name\n"));
    }

    #[test]
    fn test_parse_structured_quoted_params() {
        let ct = parse_structured("Multipart/Mixed; boundary=\"a;b\"; charset=utf-8");
        assert_eq!(ct.value, "multipart/mixed");
        assert_eq!(ct.param("boundary"), Some("a;b"));
        assert_eq!(ct.param("charset"), Some("utf-8"));
    }

    #[test]
    fn test_parse_structured_rfc2231() {
        let cd = parse_structured(
            "attachment; filename*0*=UTF-8''na%C3%AFve; filename*1=\" file.txt\"",
        );
        assert_eq!(cd.value, "attachment");
        assert_eq!(cd.param("filename"), Some("naïve file.txt"));

        let simple = parse_structured("inline; filename*=iso-8859-1'en'caf%E9.txt");
        assert_eq!(simple.param("filename"), Some("café.txt"));
    }

    #[test]
    fn test_parse_structured_encoded_word_filename() {
        let cd = parse_structured("attachment; filename=\"=?UTF-8?B?SG9sYS5wZGY=?=\"");
        assert_eq!(cd.param("filename"), Some("Hola.pdf"));
    }

    #[test]
    fn test_extract_angle_brackets() {
        assert_eq!(extract_angle_bracket(" <msg001@example.com> "), "msg001@example.com");
        let refs = extract_all_angle_brackets("<a@b.com> <c@d.com>\t<e@f.com>");
        assert_eq!(refs, vec!["a@b.com", "c@d.com", "e@f.com"]);
    }

    #[test]
    fn test_parse_date_rfc2822() {
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 +0000").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-04");
    }

    #[test]
    fn test_parse_date_named_tz_and_comment() {
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 EST").unwrap();
        assert_eq!(dt.format("%H").to_string(), "15");
        assert!(parse_date("Thu, 4 Jan 2024 10:00:00 -0800 (PST)").is_some());
    }

    #[test]
    fn test_parse_date_iso8601() {
        assert!(parse_date("2024-01-04T10:00:00Z").is_some());
    }

    #[test]
    fn test_parse_date_imap_style() {
        let dt = parse_date("16-JUL-2025 03:01:03").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2025-07-16");
        assert_eq!(normalize_imap_date("04 Jan 2024 10:00:00"), "04 Jan 2024 10:00:00");
    }

    #[test]
    fn test_parse_date_garbage() {
        assert!(parse_date("").is_none());
        assert!(parse_date("not a date at all").is_none());
    }
}
