//! Read-back validation of a closed document.
//!
//! The checker streams the document with `quick_xml::NsReader` and verifies:
//! every element is an EAXS element in its content model position, simple
//! values have the right lexical form, `LocalId` values run 1..N in document
//! order, every `Mbox` re-hashes to its declared value and every
//! `ExtBodyContent` file exists, re-hashes and matches its `XMLWrapped` flag.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::DateTime;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use serde::Serialize;

use super::{external, NAMESPACE};
use crate::digest::{hash_file, Digest, HashAlgorithm};
use crate::error::{ConvertError, Result};
use crate::model::account::ExternalContentReference;
use crate::report::Diagnostic;

/// Outcome of validating one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub path: PathBuf,
    /// Top-level `Message` elements seen.
    pub messages: u64,
    /// `LocalId` elements seen.
    pub local_ids: u64,
    pub mboxes: u64,
    pub external_files: u64,
    /// Content-model, lexical and LocalId problems.
    pub validation_errors: Vec<String>,
    /// Hash mismatches and missing files.
    pub integrity_errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty() && self.integrity_errors.is_empty()
    }

    /// Every problem as an error-level diagnostic.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let doc = self.path.display();
        self.validation_errors
            .iter()
            .map(|e| Diagnostic::error(format!("Validation of '{doc}' failed: {e}")))
            .chain(
                self.integrity_errors
                    .iter()
                    .map(|e| Diagnostic::error(format!("Integrity check of '{doc}' failed: {e}"))),
            )
            .collect()
    }
}

/// Validate an `Account` document on disk, resolving relative paths against
/// its directory.
pub fn validate_document(path: &Path) -> Result<ValidationReport> {
    let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut checker = Checker::new("Account", Some(base));
    checker.run(BufReader::new(file));
    let mut report = checker.report;
    report.path = path.to_path_buf();
    Ok(report)
}

/// Check that `bytes` form a standalone wrapped `BodyContent` document.
pub fn check_body_content(bytes: &[u8]) -> std::result::Result<(), String> {
    let mut checker = Checker::new("BodyContent", None);
    checker.run(bytes);
    match checker.report.validation_errors.into_iter().next() {
        Some(reason) => Err(reason),
        None => Ok(()),
    }
}

pub fn is_wrapped_body_content(bytes: &[u8]) -> bool {
    check_body_content(bytes).is_ok()
}

// ── Content model ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Particle {
    names: &'static [&'static str],
    min: u32,
    max: Option<u32>,
}

const fn one(names: &'static [&'static str]) -> Particle {
    Particle {
        names,
        min: 1,
        max: Some(1),
    }
}

const fn opt(names: &'static [&'static str]) -> Particle {
    Particle {
        names,
        min: 0,
        max: Some(1),
    }
}

const fn many(names: &'static [&'static str]) -> Particle {
    Particle {
        names,
        min: 0,
        max: None,
    }
}

const fn some(names: &'static [&'static str]) -> Particle {
    Particle {
        names,
        min: 1,
        max: None,
    }
}

const ACCOUNT: &[Particle] = &[many(&["EmailAddress"]), one(&["GlobalId"]), many(&["Folder"])];

const FOLDER: &[Particle] = &[
    one(&["Name"]),
    many(&["Message"]),
    opt(&["Mbox"]),
    many(&["Folder"]),
];

const MBOX: &[Particle] = &[
    one(&["RelPath"]),
    opt(&["FileExt"]),
    opt(&["Eol"]),
    one(&["Hash"]),
    opt(&["Size"]),
    opt(&["MessageCount"]),
];

const HASH: &[Particle] = &[one(&["Value"]), one(&["Function"])];

const MESSAGE: &[Particle] = &[
    opt(&["RelPath"]),
    one(&["LocalId"]),
    opt(&["MessageId"]),
    opt(&["MimeVersion"]),
    opt(&["OrigDate"]),
    opt(&["From"]),
    opt(&["Sender"]),
    opt(&["To"]),
    opt(&["Cc"]),
    opt(&["Bcc"]),
    many(&["InReplyTo"]),
    many(&["References"]),
    opt(&["Subject"]),
    many(&["Comments"]),
    many(&["Keywords"]),
    many(&["Header"]),
    many(&["StatusFlag"]),
    one(&["SingleBody", "MultiBody"]),
    many(&["Incomplete"]),
    opt(&["MessageProperties"]),
];

const ADDRESS_LIST: &[Particle] = &[some(&["Mailbox", "Group"])];

const GROUP: &[Particle] = &[one(&["Name"]), many(&["Mailbox"])];

const NAME_VALUE: &[Particle] = &[one(&["Name"]), one(&["Value"])];

const INCOMPLETE: &[Particle] = &[one(&["ErrorType"]), opt(&["ErrorLocation"])];

const MESSAGE_PROPERTIES: &[Particle] = &[opt(&["Eol"]), one(&["Hash"]), opt(&["Size"])];

const MULTI_BODY: &[Particle] = &[
    opt(&["ContentType"]),
    opt(&["Charset"]),
    opt(&["ContentName"]),
    opt(&["BoundaryString"]),
    many(&["ContentTypeParam"]),
    opt(&["TransferEncoding"]),
    opt(&["ContentId"]),
    opt(&["Description"]),
    opt(&["Disposition"]),
    opt(&["DispositionFileName"]),
    many(&["DispositionParam"]),
    many(&["ContentLanguage"]),
    many(&["OtherMimeHeader"]),
    opt(&["Preamble"]),
    some(&["SingleBody", "MultiBody", "MissingBody"]),
    opt(&["Epilogue"]),
];

const SINGLE_BODY: &[Particle] = &[
    opt(&["ContentType"]),
    opt(&["Charset"]),
    opt(&["ContentName"]),
    many(&["ContentTypeParam"]),
    opt(&["TransferEncoding"]),
    opt(&["ContentId"]),
    opt(&["Description"]),
    opt(&["Disposition"]),
    opt(&["DispositionFileName"]),
    many(&["DispositionParam"]),
    many(&["ContentLanguage"]),
    many(&["OtherMimeHeader"]),
    opt(&["BodyContent", "ExtBodyContent", "ChildMessage", "PhantomBody"]),
];

const BODY_CONTENT: &[Particle] = &[
    one(&["Content"]),
    opt(&["TransferEncoding"]),
    opt(&["Hash"]),
    opt(&["Size"]),
];

const EXT_BODY_CONTENT: &[Particle] = &[
    one(&["RelPath"]),
    one(&["LocalId"]),
    one(&["XMLWrapped"]),
    one(&["Hash"]),
    opt(&["Size"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextType {
    Any,
    Integer,
    DateTime,
    Boolean,
    Eol,
    StatusFlag,
}

#[derive(Debug, Clone, Copy)]
enum Content {
    Elements(&'static [Particle]),
    Text(TextType),
    Empty,
    Unknown,
}

fn content_of(local: &str) -> Content {
    use TextType::*;
    match local {
        "Account" => Content::Elements(ACCOUNT),
        "Folder" => Content::Elements(FOLDER),
        "Mbox" => Content::Elements(MBOX),
        "Hash" => Content::Elements(HASH),
        "Message" | "ChildMessage" => Content::Elements(MESSAGE),
        "From" | "To" | "Cc" | "Bcc" => Content::Elements(ADDRESS_LIST),
        "Group" => Content::Elements(GROUP),
        "Header" | "ContentTypeParam" | "DispositionParam" | "OtherMimeHeader" => {
            Content::Elements(NAME_VALUE)
        }
        "Incomplete" => Content::Elements(INCOMPLETE),
        "MessageProperties" => Content::Elements(MESSAGE_PROPERTIES),
        "MultiBody" => Content::Elements(MULTI_BODY),
        "SingleBody" => Content::Elements(SINGLE_BODY),
        "BodyContent" => Content::Elements(BODY_CONTENT),
        "ExtBodyContent" => Content::Elements(EXT_BODY_CONTENT),
        "Mailbox" | "Sender" | "MissingBody" => Content::Empty,
        "LocalId" | "Size" | "MessageCount" => Content::Text(Integer),
        "OrigDate" => Content::Text(DateTime),
        "XMLWrapped" => Content::Text(Boolean),
        "Eol" => Content::Text(Eol),
        "StatusFlag" => Content::Text(StatusFlag),
        "EmailAddress" | "GlobalId" | "Name" | "RelPath" | "FileExt" | "Value" | "Function"
        | "MessageId" | "MimeVersion" | "InReplyTo" | "References" | "Subject" | "Comments"
        | "Keywords" | "ErrorType" | "ErrorLocation" | "ContentType" | "Charset"
        | "ContentName" | "BoundaryString" | "TransferEncoding" | "ContentId"
        | "Description" | "Disposition" | "DispositionFileName" | "ContentLanguage"
        | "Preamble" | "Epilogue" | "Content" | "PhantomBody" => Content::Text(Any),
        _ => Content::Unknown,
    }
}

fn lexically_valid(kind: TextType, text: &str) -> bool {
    let text = text.trim();
    match kind {
        TextType::Any => true,
        TextType::Integer => text.parse::<u64>().is_ok(),
        TextType::DateTime => DateTime::parse_from_rfc3339(text).is_ok(),
        TextType::Boolean => matches!(text, "true" | "false" | "1" | "0"),
        TextType::Eol => matches!(text, "CR" | "LF" | "CRLF"),
        TextType::StatusFlag => matches!(
            text,
            "Seen" | "Answered" | "Flagged" | "Deleted" | "Draft" | "Recent"
        ),
    }
}

/// Position inside one element's content model.
#[derive(Debug)]
struct Sequence {
    model: &'static [Particle],
    index: usize,
    count: u32,
}

impl Sequence {
    fn new(model: &'static [Particle]) -> Self {
        Self { model, index: 0, count: 0 }
    }

    fn accept(&mut self, name: &str) -> std::result::Result<(), String> {
        let (index, count) = (self.index, self.count);
        while let Some(particle) = self.model.get(self.index) {
            let room = particle.max.is_none_or(|max| self.count < max);
            if room && particle.names.contains(&name) {
                self.count += 1;
                return Ok(());
            }
            if self.count < particle.min {
                return Err(format!(
                    "expected {} before '{name}'",
                    particle.names.join(" | ")
                ));
            }
            self.index += 1;
            self.count = 0;
        }
        self.index = index;
        self.count = count;
        Err(format!("unexpected element '{name}'"))
    }

    fn finish(&self) -> std::result::Result<(), String> {
        let mut count = self.count;
        for particle in self.model.iter().skip(self.index) {
            if count < particle.min {
                return Err(format!("missing {}", particle.names.join(" | ")));
            }
            count = 0;
        }
        Ok(())
    }
}

struct Frame {
    local: String,
    content: Content,
    sequence: Option<Sequence>,
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefKind {
    Mbox,
    External,
}

/// Fields of an `Mbox` or `ExtBodyContent` collected until its end tag.
struct PendingRef {
    kind: RefKind,
    rel_path: Option<String>,
    wrapped: Option<bool>,
    value: Option<String>,
    function: Option<String>,
}

struct Checker {
    root: &'static str,
    base: Option<PathBuf>,
    stack: Vec<Frame>,
    seen_root: bool,
    next_local_id: u64,
    external_folder: String,
    /// `RelPath` of the current top-level message: the folder its
    /// `ExtBodyContent` paths are relative to.
    message_rel_path: Option<String>,
    pending: Option<PendingRef>,
    report: ValidationReport,
}

impl Checker {
    fn new(root: &'static str, base: Option<PathBuf>) -> Self {
        Self {
            root,
            base,
            stack: Vec::new(),
            seen_root: false,
            next_local_id: 1,
            external_folder: "ExtBodyContent".to_string(),
            message_rel_path: None,
            pending: None,
            report: ValidationReport::default(),
        }
    }

    fn invalid(&mut self, reason: impl Into<String>) {
        self.report.validation_errors.push(reason.into());
    }

    fn integrity(&mut self, reason: impl Into<String>) {
        self.report.integrity_errors.push(reason.into());
    }

    fn run<R: BufRead>(&mut self, input: R) {
        let mut reader = NsReader::from_reader(input);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        loop {
            match reader.read_resolved_event_into(&mut buf) {
                Ok((ns, Event::Start(e))) => {
                    let in_ns = in_namespace(&ns);
                    let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    self.open(in_ns, local);
                }
                Ok((ns, Event::Empty(e))) => {
                    let in_ns = in_namespace(&ns);
                    let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    self.open(in_ns, local);
                    self.close();
                }
                Ok((_, Event::End(_))) => self.close(),
                Ok((_, Event::Text(t))) => match t.unescape() {
                    Ok(text) => self.text(&text),
                    Err(e) => self.invalid(format!("bad character reference: {e}")),
                },
                Ok((_, Event::CData(c))) => self.text(&String::from_utf8_lossy(&c)),
                Ok((_, Event::PI(pi))) => self.instruction(&String::from_utf8_lossy(&pi)),
                Ok((_, Event::Eof)) => break,
                Ok(_) => {}
                Err(e) => {
                    let position = reader.buffer_position();
                    self.invalid(format!("not well-formed XML at byte {position}: {e}"));
                    return;
                }
            }
            buf.clear();
        }
        if !self.seen_root {
            self.invalid(format!("no '{}' root element", self.root));
        }
    }

    fn instruction(&mut self, raw: &str) {
        if let Some(("ExternalContentFolder", value)) = raw.trim().split_once(' ') {
            self.external_folder = value.trim().to_string();
        }
    }

    fn open(&mut self, in_ns: bool, local: String) {
        if !in_ns {
            self.invalid(format!("element '{local}' is not in the {NAMESPACE} namespace"));
        }

        let problem = match self.stack.last_mut() {
            None if self.seen_root => Some("more than one root element".to_string()),
            None if local != self.root => {
                Some(format!("root element is '{local}', expected '{}'", self.root))
            }
            None => None,
            Some(parent) => match (&parent.content, parent.sequence.as_mut()) {
                (Content::Unknown, _) => None,
                (_, Some(sequence)) => sequence
                    .accept(&local)
                    .err()
                    .map(|reason| format!("in '{}': {reason}", parent.local)),
                (_, None) => Some(format!(
                    "'{}' may not contain element '{local}'",
                    parent.local
                )),
            },
        };
        if let Some(problem) = problem {
            self.invalid(problem);
        }
        if self.stack.is_empty() {
            self.seen_root = true;
        }

        let content = content_of(&local);
        if matches!(content, Content::Unknown) {
            self.invalid(format!("unknown element '{local}'"));
        }
        match local.as_str() {
            "Message" if self.parent_is("Folder") => {
                self.report.messages += 1;
                self.message_rel_path = None;
            }
            "Mbox" => self.pending = Some(PendingRef::new(RefKind::Mbox)),
            "ExtBodyContent" => self.pending = Some(PendingRef::new(RefKind::External)),
            _ => {}
        }
        let sequence = match content {
            Content::Elements(model) => Some(Sequence::new(model)),
            _ => None,
        };
        self.stack.push(Frame {
            local,
            content,
            sequence,
            text: String::new(),
        });
    }

    fn parent_is(&self, local: &str) -> bool {
        self.stack.last().is_some_and(|f| f.local == local)
    }

    fn text(&mut self, text: &str) {
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        match frame.content {
            Content::Text(_) => frame.text.push_str(text),
            Content::Unknown => {}
            Content::Elements(_) | Content::Empty => {
                if !text.trim().is_empty() {
                    let local = frame.local.clone();
                    self.invalid(format!("unexpected text in '{local}'"));
                }
            }
        }
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if let Some(sequence) = &frame.sequence {
            if let Err(reason) = sequence.finish() {
                self.invalid(format!("in '{}': {reason}", frame.local));
            }
        }
        if let Content::Text(kind) = frame.content {
            if !lexically_valid(kind, &frame.text) {
                self.invalid(format!(
                    "'{}' is not a valid value for '{}'",
                    frame.text, frame.local
                ));
            }
        }

        match frame.local.as_str() {
            "LocalId" => self.local_id(&frame.text),
            "RelPath" if self.pending.is_none() && self.parent_is("Message") => {
                self.message_rel_path = Some(frame.text.trim().to_string());
            }
            "RelPath" | "XMLWrapped" | "Value" | "Function" => {
                if let Some(pending) = self.pending.as_mut() {
                    let text = frame.text.trim().to_string();
                    match frame.local.as_str() {
                        "RelPath" => pending.rel_path = Some(text),
                        "XMLWrapped" => {
                            pending.wrapped = Some(matches!(text.as_str(), "true" | "1"))
                        }
                        "Value" => pending.value = Some(text),
                        _ => pending.function = Some(text),
                    }
                }
            }
            "Mbox" | "ExtBodyContent" => {
                if let Some(pending) = self.pending.take() {
                    self.verify(pending);
                }
            }
            _ => {}
        }
    }

    fn local_id(&mut self, text: &str) {
        let expected = self.next_local_id;
        if text.trim().parse::<u64>().ok() != Some(expected) {
            self.invalid(format!("LocalId '{text}' out of sequence, expected {expected}"));
        }
        self.next_local_id += 1;
        self.report.local_ids += 1;
    }

    fn verify(&mut self, pending: PendingRef) {
        let Some(base) = self.base.clone() else {
            return;
        };
        let (Some(rel_path), Some(value), Some(function)) =
            (pending.rel_path, pending.value, pending.function)
        else {
            // Already reported as a content-model problem.
            return;
        };
        let algorithm = match function.parse::<HashAlgorithm>() {
            Ok(a) => a,
            Err(e) => return self.integrity(e.to_string()),
        };
        let Ok(bytes) = hex::decode(&value) else {
            return self.integrity(format!("declared hash '{value}' is not hexadecimal"));
        };
        let declared = Digest { algorithm, bytes };

        match pending.kind {
            RefKind::Mbox => {
                self.report.mboxes += 1;
                let path = base.join(&rel_path);
                if !path.is_file() {
                    return self.integrity(ConvertError::MissingExternalFile(path).to_string());
                }
                match hash_file(algorithm, &path) {
                    Ok(computed) if computed == declared => {}
                    Ok(computed) => self.integrity(
                        ConvertError::HashMismatch {
                            path,
                            declared: declared.to_hex(),
                            computed: computed.to_hex(),
                        }
                        .to_string(),
                    ),
                    Err(e) => self.integrity(e.to_string()),
                }
            }
            RefKind::External => {
                self.report.external_files += 1;
                let wrapped = pending.wrapped.unwrap_or(false);
                let folder = self
                    .message_rel_path
                    .as_deref()
                    .unwrap_or(&self.external_folder);
                let path = base.join(folder).join(&rel_path);
                let reference = ExternalContentReference {
                    rel_path,
                    path: path.clone(),
                    hash: declared,
                    size: 0,
                    wrapped,
                };
                if let Err(e) = external::verify(&reference) {
                    return self.integrity(e.to_string());
                }
                let bytes = match std::fs::read(&path) {
                    Ok(b) => b,
                    Err(e) => return self.integrity(ConvertError::io(&path, e).to_string()),
                };
                match (wrapped, check_body_content(&bytes)) {
                    (true, Err(reason)) => self.invalid(format!(
                        "wrapped file '{}' is not a BodyContent document: {reason}",
                        path.display()
                    )),
                    (false, Ok(())) => self.invalid(format!(
                        "file '{}' is marked unwrapped but is a BodyContent document",
                        path.display()
                    )),
                    _ => {}
                }
            }
        }
    }
}

impl PendingRef {
    fn new(kind: RefKind) -> Self {
        Self {
            kind,
            rel_path: None,
            wrapped: None,
            value: None,
            function: None,
        }
    }
}

fn in_namespace(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == NAMESPACE.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::hash_bytes;

    const HEAD: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xm:Account xmlns:xm="https://github.com/StateArchivesOfNorthCarolina/tomes-eaxs-2">"#;

    fn message(id: u64, child_id: u64) -> String {
        format!(
            "<xm:Message><xm:RelPath>ExtBodyContent</xm:RelPath><xm:LocalId>{id}</xm:LocalId>\
<xm:SingleBody><xm:ChildMessage><xm:LocalId>{child_id}</xm:LocalId><xm:SingleBody>\
<xm:BodyContent><xm:Content><![CDATA[hi]]></xm:Content></xm:BodyContent></xm:SingleBody>\
</xm:ChildMessage></xm:SingleBody></xm:Message>"
        )
    }

    fn validate(body: &str) -> ValidationReport {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.xml");
        std::fs::write(&path, format!("{HEAD}{body}</xm:Account>")).unwrap();
        validate_document(&path).unwrap()
    }

    #[test]
    fn test_valid_minimal_document() {
        let report = validate(&format!(
            "<xm:GlobalId>mailto:a@b</xm:GlobalId><xm:Folder><xm:Name>inbox</xm:Name>{}{}</xm:Folder>",
            message(1, 2),
            message(3, 4)
        ));
        assert!(report.is_valid(), "{report:?}");
        assert_eq!(report.messages, 2);
        assert_eq!(report.local_ids, 4);
    }

    #[test]
    fn test_local_id_gap() {
        let report = validate(&format!(
            "<xm:GlobalId>g</xm:GlobalId><xm:Folder><xm:Name>f</xm:Name>{}{}</xm:Folder>",
            message(1, 2),
            message(4, 5)
        ));
        assert!(report.validation_errors.iter().any(|e| e.contains("out of sequence")));
    }

    #[test]
    fn test_content_model_order() {
        let report = validate("<xm:Folder><xm:Name>f</xm:Name></xm:Folder><xm:GlobalId>g</xm:GlobalId>");
        assert!(!report.validation_errors.is_empty());
    }

    #[test]
    fn test_unknown_element_and_missing_body() {
        let report = validate(
            "<xm:GlobalId>g</xm:GlobalId><xm:Folder><xm:Name>f</xm:Name>\
<xm:Message><xm:LocalId>1</xm:LocalId><xm:Bogus/></xm:Message></xm:Folder>",
        );
        assert!(report.validation_errors.iter().any(|e| e.contains("unknown element 'Bogus'")));
        assert!(report.validation_errors.iter().any(|e| e.contains("missing SingleBody | MultiBody")));
    }

    #[test]
    fn test_mbox_hash_check() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("inbox"), b"From x\n").unwrap();
        let good = hash_bytes(HashAlgorithm::Sha256, b"From x\n").to_hex();
        let doc = |value: &str| {
            format!(
                "{HEAD}<xm:GlobalId>g</xm:GlobalId><xm:Folder><xm:Name>f</xm:Name><xm:Mbox>\
<xm:RelPath>inbox</xm:RelPath><xm:Hash><xm:Value>{value}</xm:Value><xm:Function>SHA256</xm:Function>\
</xm:Hash></xm:Mbox></xm:Folder></xm:Account>"
            )
        };
        let path = dir.path().join("doc.xml");
        std::fs::write(&path, doc(&good)).unwrap();
        let report = validate_document(&path).unwrap();
        assert!(report.is_valid(), "{report:?}");
        assert_eq!(report.mboxes, 1);

        std::fs::write(&path, doc("00")).unwrap();
        let report = validate_document(&path).unwrap();
        assert_eq!(report.integrity_errors.len(), 1);
    }

    #[test]
    fn test_wrong_namespace() {
        assert!(check_body_content(b"<BodyContent><Content>x</Content></BodyContent>").is_err());
        let wrapped = format!(
            "<xm:BodyContent xmlns:xm=\"{NAMESPACE}\"><xm:Content><![CDATA[x]]></xm:Content></xm:BodyContent>"
        );
        assert!(is_wrapped_body_content(wrapped.as_bytes()));
        assert!(!is_wrapped_body_content(b"\x89PNG\r\n"));
    }

    #[test]
    fn test_lexical_checks() {
        let report = validate(
            "<xm:GlobalId>g</xm:GlobalId><xm:Folder><xm:Name>f</xm:Name><xm:Message>\
<xm:LocalId>1</xm:LocalId><xm:OrigDate>yesterday</xm:OrigDate><xm:StatusFlag>Read</xm:StatusFlag>\
<xm:MultiBody><xm:MissingBody/></xm:MultiBody></xm:Message></xm:Folder>",
        );
        assert_eq!(report.validation_errors.len(), 2, "{report:?}");
    }
}
