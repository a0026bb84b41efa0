//! EAXS document production: the XML writer, the side-file store, the
//! document builder and the read-back validator.

pub mod builder;
pub mod external;
pub mod validate;
pub mod writer;

pub use builder::{DocumentOutcome, EaxsDocumentBuilder};
pub use external::ExternalContentStore;
pub use validate::{validate_document, ValidationReport};

/// Target namespace of every element written.
pub const NAMESPACE: &str = "https://github.com/StateArchivesOfNorthCarolina/tomes-eaxs-2";
/// Prefix bound to [`NAMESPACE`].
pub const PREFIX: &str = "xm";
pub const SCHEMA_LOCATION: &str = "eaxs_schema_v2.xsd";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
