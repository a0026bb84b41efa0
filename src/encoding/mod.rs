//! Content representation: transfer decoding, encoding policy,
//! quoted-printable and XML character rules.

pub mod policy;
pub mod qp;
pub mod transfer;
pub mod xmlchars;

pub use policy::{ContentEncodingPolicy, ContentTransferEncoding, EncodedContent, Placement};
