//! Per-message summary CSV written next to each document.
//!
//! Output is UTF-8 with BOM for Excel compatibility.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::SecondsFormat;
use serde::Serialize;

use crate::error::{ConvertError, Result};
use crate::model::message::Message;

const HEADER: &str =
    "LocalId,From,To,Date,Subject,MessageID,Hash,Errors,FirstErrorMessage,SourceFile,DestinationFile";

/// One CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageBrief {
    pub local_id: u64,
    pub from: String,
    pub to: String,
    pub date: String,
    pub subject: String,
    pub message_id: String,
    pub hash: String,
    /// Warning and error lines written for the message.
    pub errors: u64,
    pub first_error_message: String,
    pub source_file: String,
    pub destination_file: String,
}

impl MessageBrief {
    pub fn new(
        local_id: u64,
        message: &Message,
        errors: u64,
        first_error_message: String,
        source_file: String,
        destination_file: String,
    ) -> Self {
        let to = message
            .to
            .iter()
            .flat_map(|entry| entry.mailboxes())
            .map(|m| m.display())
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            local_id,
            from: message.first_from().map(|m| m.display()).unwrap_or_default(),
            to,
            date: message
                .orig_date
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
            subject: message.subject.clone().unwrap_or_default(),
            message_id: message.message_id.clone().unwrap_or_default(),
            hash: message
                .properties
                .as_ref()
                .map(|p| p.hash.to_hex())
                .unwrap_or_default(),
            errors,
            first_error_message,
            source_file,
            destination_file,
        }
    }
}

/// Write the summary rows to `output_path`.
pub fn write_briefs(briefs: &[MessageBrief], output_path: &Path) -> Result<()> {
    let io_err = |e| ConvertError::io(output_path, e);
    let mut file = BufWriter::new(File::create(output_path).map_err(io_err)?);

    // UTF-8 BOM for Excel
    file.write_all(&[0xEF, 0xBB, 0xBF]).map_err(io_err)?;
    writeln!(file, "{HEADER}").map_err(io_err)?;

    for brief in briefs {
        let row = [
            brief.local_id.to_string(),
            csv_escape(&brief.from),
            csv_escape(&brief.to),
            csv_escape(&brief.date),
            csv_escape(&brief.subject),
            csv_escape(&brief.message_id),
            brief.hash.clone(),
            brief.errors.to_string(),
            csv_escape(&brief.first_error_message),
            csv_escape(&brief.source_file),
            csv_escape(&brief.destination_file),
        ]
        .join(",");
        writeln!(file, "{row}").map_err(io_err)?;
    }
    file.flush().map_err(io_err)
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escape_simple() {
        assert_eq!(csv_escape("hello"), "hello");
    }

    #[test]
    fn test_csv_escape_comma() {
        assert_eq!(csv_escape("hello, world"), "\"hello, world\"");
    }

    #[test]
    fn test_csv_escape_quotes() {
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_write_briefs_has_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.csv");
        let brief = MessageBrief {
            local_id: 1,
            from: "Alice <alice@example.com>".into(),
            to: String::new(),
            date: "2024-01-04T10:00:00Z".into(),
            subject: "Lunch, maybe?".into(),
            message_id: "m1@example.com".into(),
            hash: "AB".into(),
            errors: 0,
            first_error_message: String::new(),
            source_file: "inbox".into(),
            destination_file: "inbox.xml".into(),
        };
        write_briefs(&[brief], &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(HEADER));
        assert_eq!(
            lines.next(),
            Some("1,Alice <alice@example.com>,,2024-01-04T10:00:00Z,\"Lunch, maybe?\",m1@example.com,AB,0,,inbox,inbox.xml")
        );
    }
}
