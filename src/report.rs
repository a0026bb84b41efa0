//! Diagnostics and the per-run conversion report.
//!
//! Every diagnostic that ends up in a document as an `ERROR:` / `WARNING:` /
//! `INFO:` comment is also logged through `tracing` and counted here, so the
//! counts in [`ConversionReport`] always match the comments in the output.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Severity prefix of a diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// One recorded problem or note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Mirror the diagnostic to the tracing sink at the matching level.
    pub fn log(&self) {
        match self.severity {
            Severity::Info => tracing::info!("{}", self.message),
            Severity::Warning => tracing::warn!("{}", self.message),
            Severity::Error => tracing::error!("{}", self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.prefix(), self.message)
    }
}

/// Aggregated outcome of one `convert_file` / `convert_folder` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionReport {
    /// Top-level messages emitted without an `Incomplete` marker.
    pub valid_messages: u64,
    /// Top-level messages emitted with an `Incomplete` marker.
    pub incomplete_messages: u64,
    pub errors: u64,
    pub warnings: u64,
    pub infos: u64,
    /// Content-model or LocalId problems found when re-reading documents.
    pub validation_failures: u64,
    /// Hash mismatches and missing files found when re-reading documents.
    pub integrity_failures: u64,
    /// XML documents written, in production order.
    pub documents: Vec<PathBuf>,
    /// External content files written.
    pub external_files: u64,
}

impl ConversionReport {
    /// Count (and log) one diagnostic line.
    pub fn record(&mut self, diagnostic: &Diagnostic) {
        diagnostic.log();
        match diagnostic.severity {
            Severity::Info => self.infos += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Error => self.errors += 1,
        }
    }

    /// Fold the counts of another report into this one.
    pub fn merge(&mut self, other: ConversionReport) {
        self.valid_messages += other.valid_messages;
        self.incomplete_messages += other.incomplete_messages;
        self.errors += other.errors;
        self.warnings += other.warnings;
        self.infos += other.infos;
        self.validation_failures += other.validation_failures;
        self.integrity_failures += other.integrity_failures;
        self.external_files += other.external_files;
        self.documents.extend(other.documents);
    }

    /// A run with any error-level line is a failed run.
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}
