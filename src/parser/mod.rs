//! Mailbox parsing: mbox segmentation, header decoding, MIME decomposition
//! and mail-client quirks.

pub mod header;
pub mod mbox;
pub mod mime;
pub mod quirks;
