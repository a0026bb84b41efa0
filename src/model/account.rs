//! Account-level records: the owner, source mbox files and side files.

use std::path::PathBuf;

use super::address::split_owner_addresses;
use super::message::Eol;
use crate::digest::Digest;

/// The mailbox owner an output document describes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    /// Owner URI, written as `GlobalId`.
    pub global_id: String,
    /// Owner addresses, written as `EmailAddress`.
    pub addresses: Vec<String>,
}

impl Account {
    /// Build from an owner URI and a `,` / `;` / whitespace separated address list.
    pub fn new(global_id: impl Into<String>, owner_addresses: &str) -> Self {
        Self {
            global_id: global_id.into(),
            addresses: split_owner_addresses(owner_addresses),
        }
    }

    pub fn is_owner(&self, address: &str) -> bool {
        self.addresses
            .iter()
            .any(|a| a.eq_ignore_ascii_case(address.trim()))
    }
}

/// One physical source mailbox, written as `Mbox`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MboxFile {
    /// Path relative to the output document.
    pub rel_path: String,
    pub file_ext: Option<String>,
    pub eol: Option<Eol>,
    pub hash: Digest,
    pub size: u64,
    pub message_count: u64,
    /// Absolute path, used to re-hash the file after writing.
    pub source: PathBuf,
}

/// A payload written outside the document, written as `ExtBodyContent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalContentReference {
    /// Path relative to the external content folder.
    pub rel_path: String,
    /// Absolute path of the side file.
    pub path: PathBuf,
    pub hash: Digest,
    pub size: u64,
    pub wrapped: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_owner_addresses() {
        let account = Account::new("mailto:me@example.com", "me@example.com; Me@Other.org");
        assert_eq!(account.addresses.len(), 2);
        assert!(account.is_owner("me@other.org"));
        assert!(!account.is_owner("you@example.com"));
    }
}
