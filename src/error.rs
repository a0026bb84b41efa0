//! Centralized error types for mbox2eaxs.
//!
//! Per-message and per-part problems never surface here: they are downgraded
//! to diagnostics (see [`crate::report`]). A `ConvertError` either aborts the
//! whole call (argument and I/O errors) or is reported by the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification used by callers to decide exit status and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid input or output paths. Raised before any output is produced.
    Argument,
    /// Unparseable mbox or MIME structure.
    Structural,
    /// Hash mismatch or missing external file.
    Integrity,
    /// The emitted document does not satisfy the content model.
    Validation,
    /// Underlying filesystem failure.
    Io,
}

/// All errors produced by the mbox2eaxs library.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified input does not exist.
    #[error("Input not found: {0}")]
    FileNotFound(PathBuf),

    /// An invalid path was provided.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The output folder could overwrite or alias the input.
    #[error("Output folder '{output}' collides with input '{input}'")]
    OutputAliasesInput { input: PathBuf, output: PathBuf },

    /// The hash algorithm name is not one we can compute.
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    /// The file does not appear to be a valid mbox.
    #[error("File does not appear to be a valid mbox: {0}")]
    InvalidMbox(PathBuf),

    /// A parsing error occurred at a specific byte offset.
    #[error("Parse error at offset {offset}: {reason}")]
    ParseError { offset: u64, reason: String },

    /// A MIME structure could not be decomposed.
    #[error("MIME error: {0}")]
    MimeError(String),

    /// Writing the XML document failed.
    #[error("XML write error: {0}")]
    Xml(String),

    /// A declared hash does not match the bytes on disk.
    #[error("Hash mismatch for '{path}': declared {declared}, computed {computed}")]
    HashMismatch {
        path: PathBuf,
        declared: String,
        computed: String,
    },

    /// An external content file referenced by a document is missing.
    #[error("Missing external content file: {0}")]
    MissingExternalFile(PathBuf),

    /// The document failed content-model validation.
    #[error("Validation failed for '{path}': {reason}")]
    Validation { path: PathBuf, reason: String },

    /// The builder was driven out of order.
    #[error("Document builder is {state}, cannot {action}")]
    InvalidState {
        state: &'static str,
        action: &'static str,
    },
}

/// Convenience alias for `Result<T, ConvertError>`.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an `Xml` variant from any displayable writer error.
    pub fn xml(err: impl std::fmt::Display) -> Self {
        Self::Xml(err.to_string())
    }

    /// Which part of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound(_)
            | Self::InvalidPath(_)
            | Self::OutputAliasesInput { .. }
            | Self::UnsupportedHashAlgorithm(_) => ErrorKind::Argument,
            Self::InvalidMbox(_) | Self::ParseError { .. } | Self::MimeError(_) => {
                ErrorKind::Structural
            }
            Self::HashMismatch { .. } | Self::MissingExternalFile(_) => ErrorKind::Integrity,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Io { .. } | Self::Xml(_) | Self::InvalidState { .. } => ErrorKind::Io,
        }
    }

    /// True for errors that reject the call before any output is written.
    pub fn is_argument_error(&self) -> bool {
        self.kind() == ErrorKind::Argument
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `ConvertError::io`).
impl From<std::io::Error> for ConvertError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
