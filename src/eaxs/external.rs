//! Side files for externalized payloads.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::validate::is_wrapped_body_content;
use super::writer::EaxsWriter;
use crate::digest::{hash_bytes, hash_file, HashAlgorithm};
use crate::encoding::ContentEncodingPolicy;
use crate::error::{ConvertError, Result};
use crate::model::account::ExternalContentReference;
use crate::model::body::MimeFields;
use crate::report::Diagnostic;

/// Extensions inferred from the media type when the file name has none.
const TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("application/msword", "doc"),
    ("application/octet-stream", "bin"),
    ("application/pdf", "pdf"),
    ("application/postscript", "ps"),
    ("application/rtf", "rtf"),
    ("application/vnd.ms-excel", "xls"),
    ("application/vnd.ms-powerpoint", "ppt"),
    ("application/zip", "zip"),
    ("audio/mpeg", "mp3"),
    ("image/gif", "gif"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/tiff", "tif"),
    ("text/calendar", "ics"),
    ("text/html", "html"),
    ("text/plain", "txt"),
    ("text/x-vcard", "vcf"),
    ("video/mp4", "mp4"),
];

/// A stored payload plus whatever was noticed while storing it.
#[derive(Debug)]
pub struct StoredContent {
    pub reference: ExternalContentReference,
    pub diagnostics: Vec<Diagnostic>,
}

/// Writes side files under `<folder>/<document stem>/`.
pub struct ExternalContentStore {
    /// The external content folder, next to the document.
    root: PathBuf,
    doc_stem: String,
    algorithm: HashAlgorithm,
    wrap: bool,
    policy: ContentEncodingPolicy,
    written: u64,
}

impl ExternalContentStore {
    pub fn new(
        root: impl Into<PathBuf>,
        doc_stem: impl Into<String>,
        algorithm: HashAlgorithm,
        wrap: bool,
        policy: ContentEncodingPolicy,
    ) -> Self {
        Self {
            root: root.into(),
            doc_stem: doc_stem.into(),
            algorithm,
            wrap,
            policy,
            written: 0,
        }
    }

    /// Number of files written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist the decoded payload of part `part_id` of message `message_id`.
    pub fn store(
        &mut self,
        message_id: u64,
        part_id: u64,
        fields: &MimeFields,
        data: &[u8],
    ) -> Result<StoredContent> {
        let mut diagnostics = Vec::new();
        let mut wrapped = self.wrap;
        if !wrapped && is_wrapped_body_content(data) {
            diagnostics.push(Diagnostic::warning(format!(
                "Part {part_id} is itself a BodyContent document; it is stored as wrapped XML"
            )));
            wrapped = true;
        }

        let (bytes, extension) = if wrapped {
            let encoded = self.policy.encode(fields, data);
            diagnostics.extend(encoded.diagnostics.iter().cloned());
            let transfer_encoding = encoded.transfer_encoding.map(|t| t.as_str());
            (
                wrap_content(&encoded.content, transfer_encoding)?,
                "xml".to_string(),
            )
        } else {
            (data.to_vec(), extension_for(fields))
        };

        let file_name = format!("{message_id}-{part_id}.{extension}");
        let rel_path = format!("{}/{file_name}", self.doc_stem);
        let path = self.root.join(&self.doc_stem).join(&file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;
        }
        fs::write(&path, &bytes).map_err(|e| ConvertError::io(&path, e))?;
        self.written += 1;
        debug!(path = %path.display(), size = bytes.len(), wrapped, "Wrote external content");

        Ok(StoredContent {
            reference: ExternalContentReference {
                rel_path,
                path,
                hash: hash_bytes(self.algorithm, &bytes),
                size: bytes.len() as u64,
                wrapped,
            },
            diagnostics,
        })
    }
}

/// Standalone `BodyContent` document around already encoded content.
fn wrap_content(content: &str, transfer_encoding: Option<&str>) -> Result<Vec<u8>> {
    let mut w = EaxsWriter::new(Vec::new());
    w.declaration()?;
    w.start_root("BodyContent")?;
    w.cdata_element("Content", content)?;
    w.optional("TransferEncoding", transfer_encoding)?;
    w.end("BodyContent")?;
    let mut bytes = w.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Extension from the file name, else from the media type, else `bin`.
pub fn extension_for(fields: &MimeFields) -> String {
    let from_name = fields
        .file_name()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });
    if let Some(ext) = from_name {
        return ext;
    }
    let mime_type = fields.mime_type();
    TYPE_EXTENSIONS
        .iter()
        .find(|(t, _)| *t == mime_type)
        .map(|(_, ext)| (*ext).to_string())
        .unwrap_or_else(|| "bin".to_string())
}

/// Re-hash a side file and compare it with its reference.
pub fn verify(reference: &ExternalContentReference) -> Result<()> {
    if !reference.path.is_file() {
        return Err(ConvertError::MissingExternalFile(reference.path.clone()));
    }
    let computed = hash_file(reference.hash.algorithm, &reference.path)?;
    if computed != reference.hash {
        return Err(ConvertError::HashMismatch {
            path: reference.path.clone(),
            declared: reference.hash.to_hex(),
            computed: computed.to_hex(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eaxs::validate::check_body_content;
    use crate::model::body::Param;

    fn attachment(content_type: &str, file_name: Option<&str>) -> MimeFields {
        MimeFields {
            content_type: Some(content_type.to_string()),
            disposition: Some("attachment".to_string()),
            disposition_file_name: file_name.map(str::to_string),
            ..Default::default()
        }
    }

    fn store(dir: &Path, wrap: bool) -> ExternalContentStore {
        ExternalContentStore::new(
            dir.join("ExtBodyContent"),
            "inbox",
            HashAlgorithm::Sha256,
            wrap,
            ContentEncodingPolicy::default(),
        )
    }

    #[test]
    fn test_raw_file_layout_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path(), false);
        let stored = s
            .store(3, 7, &attachment("application/pdf", Some("Report.PDF")), b"%PDF-1.4")
            .unwrap();
        let r = &stored.reference;
        assert_eq!(r.rel_path, "inbox/3-7.pdf");
        assert!(r.path.ends_with("ExtBodyContent/inbox/3-7.pdf"));
        assert!(!r.wrapped);
        assert_eq!(r.size, 8);
        assert_eq!(std::fs::read(&r.path).unwrap(), b"%PDF-1.4");
        verify(r).unwrap();
        assert_eq!(s.written(), 1);
    }

    #[test]
    fn test_wrapped_file_is_body_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path(), true);
        let stored = s
            .store(1, 2, &attachment("image/png", None), &[0x89, b'P', b'N', b'G'])
            .unwrap();
        let r = &stored.reference;
        assert!(r.wrapped);
        assert_eq!(r.rel_path, "inbox/1-2.xml");
        let bytes = std::fs::read(&r.path).unwrap();
        check_body_content(&bytes).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("<xm:TransferEncoding>base64</xm:TransferEncoding>"));
        verify(r).unwrap();
    }

    #[test]
    fn test_raw_payload_that_looks_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path(), false);
        let payload = wrap_content("hello", None).unwrap();
        let stored = s
            .store(1, 2, &attachment("application/xml", Some("a.xml")), &payload)
            .unwrap();
        assert!(stored.reference.wrapped);
        assert_eq!(stored.diagnostics.len(), 1);
    }

    #[test]
    fn test_verify_detects_tampering_and_loss() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path(), false);
        let stored = s.store(1, 2, &attachment("application/zip", None), b"PK").unwrap();
        std::fs::write(&stored.reference.path, b"PK!").unwrap();
        assert!(matches!(
            verify(&stored.reference),
            Err(ConvertError::HashMismatch { .. })
        ));
        std::fs::remove_file(&stored.reference.path).unwrap();
        assert!(matches!(
            verify(&stored.reference),
            Err(ConvertError::MissingExternalFile(_))
        ));
    }

    #[test]
    fn test_extension_fallbacks() {
        assert_eq!(extension_for(&attachment("image/jpeg", None)), "jpg");
        assert_eq!(extension_for(&attachment("application/x-thing", None)), "bin");
        assert_eq!(extension_for(&attachment("image/jpeg", Some("noext"))), "jpg");
        let mut named = attachment("application/octet-stream", None);
        named.content_type_params.push(Param::new("x", "y"));
        named.content_name = Some("data.CSV".into());
        assert_eq!(extension_for(&named), "csv");
    }
}
