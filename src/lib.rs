//! `mbox2eaxs`: convert mbox mail archives into EAXS XML documents.
//!
//! The pipeline reads each mailbox once: [`parser::mbox`] splits the stream
//! into message records, [`parser::mime`] decomposes them into the
//! [`model`] tree, and [`eaxs::EaxsDocumentBuilder`] writes the document
//! (spilling large payloads through [`eaxs::ExternalContentStore`]) and
//! re-reads it for validation. [`convert`] drives the whole thing.

pub mod config;
pub mod convert;
pub mod digest;
pub mod eaxs;
pub mod encoding;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod paths;
pub mod report;

pub use config::ConversionSettings;
pub use convert::{convert_file, convert_folder, Converter};
pub use error::{ConvertError, ErrorKind, Result};
pub use report::{ConversionReport, Diagnostic, Severity};
