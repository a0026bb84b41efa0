//! Streaming assembly of one EAXS document.
//!
//! The builder writes elements as soon as it is given them, so memory use is
//! bounded by the largest message rather than by the mailbox. Calls must
//! follow the document structure:
//!
//! ```text
//! create → start_account → (open_folder → write_message* → write_mbox? → … → close_folder)* → finish
//! ```
//!
//! Anything else fails with [`ConvertError::InvalidState`]. `LocalId`s are
//! handed out in pre-order from a counter owned by the builder, so a document
//! always numbers its messages, child messages and external content 1..N.
//! Body containers carry no `LocalId`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use tracing::{error, info};

use super::external::ExternalContentStore;
use super::validate::{validate_document, ValidationReport};
use super::writer::EaxsWriter;
use crate::config::ConversionSettings;
use crate::digest::Digest;
use crate::encoding::xmlchars::is_valid_xml_text;
use crate::encoding::{ContentEncodingPolicy, Placement};
use crate::error::{ConvertError, Result};
use crate::export::csv::MessageBrief;
use crate::model::account::{Account, MboxFile};
use crate::model::address::AddressEntry;
use crate::model::body::{Body, LeafContent, MimeFields, MultiBody, SingleBody};
use crate::model::message::Message;
use crate::report::{ConversionReport, Diagnostic, Severity};

/// Message headers that have their own elements and are not repeated as
/// `Header`.
const MAPPED_HEADERS: [&str; 13] = [
    "message-id",
    "mime-version",
    "date",
    "from",
    "sender",
    "to",
    "cc",
    "bcc",
    "in-reply-to",
    "references",
    "subject",
    "comments",
    "keywords",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    NotStarted,
    AccumulatingFolder,
    EmittingMessage,
    Closed,
}

impl BuilderState {
    pub fn name(self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::AccumulatingFolder => "accumulating a folder",
            Self::EmittingMessage => "emitting a message",
            Self::Closed => "closed",
        }
    }
}

/// Where inside `Folder` (Name, Message*, Mbox?, Folder*) the builder is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum FolderPhase {
    Messages,
    Mbox,
    Children,
}

#[derive(Debug)]
struct FolderFrame {
    source_file: String,
    messages: u64,
    /// A warning or error already explains this folder.
    flagged: bool,
    phase: FolderPhase,
}

/// What a finished document produced.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    pub report: ConversionReport,
    /// One summary row per top-level message, in document order.
    pub briefs: Vec<MessageBrief>,
    pub validation: Option<ValidationReport>,
}

pub struct EaxsDocumentBuilder {
    path: PathBuf,
    file_name: String,
    writer: Option<EaxsWriter<BufWriter<File>>>,
    state: BuilderState,
    local_id: u64,
    folders: Vec<FolderFrame>,
    account: Account,
    settings: ConversionSettings,
    policy: ContentEncodingPolicy,
    store: ExternalContentStore,
    report: ConversionReport,
    briefs: Vec<MessageBrief>,
}

impl EaxsDocumentBuilder {
    /// Create the document file. Nothing is written until
    /// [`start_account`](Self::start_account).
    pub fn create(path: &Path, account: Account, settings: &ConversionSettings) -> Result<Self> {
        let algorithm = settings.hash_algorithm()?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&dir).map_err(|e| ConvertError::io(&dir, e))?;
        }
        let file = File::create(path).map_err(|e| ConvertError::io(path, e))?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let policy = ContentEncodingPolicy::from_settings(settings);
        let store = ExternalContentStore::new(
            dir.join(&settings.external_content_folder),
            stem,
            algorithm,
            settings.wrap_external_content_in_xml,
            policy,
        );
        info!(path = %path.display(), "Creating document");

        Ok(Self {
            path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            writer: Some(EaxsWriter::new(BufWriter::new(file))),
            state: BuilderState::NotStarted,
            local_id: 0,
            folders: Vec::new(),
            account,
            settings: settings.clone(),
            policy,
            store,
            report: ConversionReport::default(),
            briefs: Vec::new(),
        })
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last `LocalId` handed out.
    pub fn last_local_id(&self) -> u64 {
        self.local_id
    }

    fn expect_state(&self, expected: BuilderState, action: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ConvertError::InvalidState {
                state: self.state.name(),
                action,
            })
        }
    }

    fn writer(&mut self) -> Result<&mut EaxsWriter<BufWriter<File>>> {
        let state = self.state.name();
        self.writer.as_mut().ok_or(ConvertError::InvalidState {
            state,
            action: "write",
        })
    }

    /// Prologue: declaration, one processing instruction per setting, the
    /// root element, owner addresses and GlobalId.
    pub fn start_account(&mut self) -> Result<()> {
        self.expect_state(BuilderState::NotStarted, "start the account")?;
        let instructions = self.settings.as_processing_instructions();
        let account = self.account.clone();
        let w = self.writer()?;
        w.declaration()?;
        for (name, value) in &instructions {
            w.processing_instruction(name, value)?;
        }
        w.start_root("Account")?;
        for address in &account.addresses {
            w.element("EmailAddress", address)?;
        }
        w.element("GlobalId", &account.global_id)?;
        self.state = BuilderState::AccumulatingFolder;
        Ok(())
    }

    /// Open a folder, nested in the current one if any. `source_file` is the
    /// mbox path reported in the summary rows of its messages.
    pub fn open_folder(&mut self, name: &str, source_file: &str) -> Result<()> {
        self.expect_state(BuilderState::AccumulatingFolder, "open a folder")?;
        if let Some(parent) = self.folders.last_mut() {
            if parent.phase < FolderPhase::Children {
                let needs_flag = parent.phase == FolderPhase::Messages;
                parent.phase = FolderPhase::Children;
                if needs_flag {
                    self.flag_empty_folder()?;
                }
            }
        }
        let w = self.writer()?;
        w.start("Folder")?;
        w.element("Name", name)?;
        self.folders.push(FolderFrame {
            source_file: source_file.to_string(),
            messages: 0,
            flagged: false,
            phase: FolderPhase::Messages,
        });
        Ok(())
    }

    /// Write a diagnostic comment at the current position.
    pub fn diagnostic(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        if matches!(self.state, BuilderState::NotStarted | BuilderState::Closed) {
            return Err(ConvertError::InvalidState {
                state: self.state.name(),
                action: "write a diagnostic",
            });
        }
        self.writer()?.comment(diagnostic)?;
        self.report.record(diagnostic);
        if diagnostic.severity >= Severity::Warning {
            if let Some(frame) = self.folders.last_mut() {
                frame.flagged = true;
            }
        }
        Ok(())
    }

    /// A folder without messages must say why.
    fn flag_empty_folder(&mut self) -> Result<()> {
        let Some(frame) = self.folders.last() else {
            return Ok(());
        };
        if frame.messages == 0 && !frame.flagged {
            self.diagnostic(&Diagnostic::warning("The folder contains no messages"))?;
        }
        Ok(())
    }

    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        self.expect_state(BuilderState::AccumulatingFolder, "write a message")?;
        let Some(frame) = self.folders.last() else {
            return Err(ConvertError::InvalidState {
                state: "outside any folder",
                action: "write a message",
            });
        };
        if frame.phase != FolderPhase::Messages {
            return Err(ConvertError::InvalidState {
                state: "past the messages of this folder",
                action: "write a message",
            });
        }
        let source_file = frame.source_file.clone();
        self.state = BuilderState::EmittingMessage;

        let writer = self.writer.as_mut().ok_or(ConvertError::InvalidState {
            state: BuilderState::EmittingMessage.name(),
            action: "write a message",
        })?;
        let mut emitter = MessageEmitter {
            writer,
            external_folder: &self.settings.external_content_folder,
            top_id: 0,
            store: &mut self.store,
            policy: self.policy,
            report: &mut self.report,
            local_id: &mut self.local_id,
            problems: 0,
            first_problem: None,
        };
        let id = emitter.message(message, true)?;
        let (problems, first_problem) = (emitter.problems, emitter.first_problem);

        if message.is_incomplete() {
            self.report.incomplete_messages += 1;
        } else {
            self.report.valid_messages += 1;
        }
        self.briefs.push(MessageBrief::new(
            id,
            message,
            problems,
            first_problem.unwrap_or_default(),
            source_file,
            self.file_name.clone(),
        ));
        if let Some(frame) = self.folders.last_mut() {
            frame.messages += 1;
        }
        self.state = BuilderState::AccumulatingFolder;
        Ok(())
    }

    /// The physical source of the current folder. Goes after its messages.
    pub fn write_mbox(&mut self, mbox: &MboxFile) -> Result<()> {
        self.expect_state(BuilderState::AccumulatingFolder, "write an mbox")?;
        match self.folders.last() {
            Some(frame) if frame.phase == FolderPhase::Messages => {}
            _ => {
                return Err(ConvertError::InvalidState {
                    state: "not before the mbox of a folder",
                    action: "write an mbox",
                })
            }
        }
        self.flag_empty_folder()?;

        let w = self.writer()?;
        w.start("Mbox")?;
        w.element("RelPath", &mbox.rel_path)?;
        w.optional("FileExt", mbox.file_ext.as_deref())?;
        w.optional("Eol", mbox.eol.map(|e| e.as_str()))?;
        write_hash(w, &mbox.hash)?;
        w.element("Size", &mbox.size.to_string())?;
        w.element("MessageCount", &mbox.message_count.to_string())?;
        w.end("Mbox")?;
        if let Some(frame) = self.folders.last_mut() {
            frame.phase = FolderPhase::Mbox;
        }
        Ok(())
    }

    pub fn close_folder(&mut self) -> Result<()> {
        self.expect_state(BuilderState::AccumulatingFolder, "close a folder")?;
        let Some(frame) = self.folders.last() else {
            return Err(ConvertError::InvalidState {
                state: "outside any folder",
                action: "close a folder",
            });
        };
        if frame.phase == FolderPhase::Messages {
            self.flag_empty_folder()?;
        }
        self.writer()?.end("Folder")?;
        self.folders.pop();
        Ok(())
    }

    /// Close every open element, flush, then validate the written document.
    ///
    /// Validation problems are logged and counted but do not fail the call.
    pub fn finish(&mut self) -> Result<DocumentOutcome> {
        self.expect_state(BuilderState::AccumulatingFolder, "finish")?;
        while !self.folders.is_empty() {
            self.close_folder()?;
        }
        self.writer()?.end("Account")?;
        let writer = self.writer.take().ok_or(ConvertError::InvalidState {
            state: self.state.name(),
            action: "finish",
        })?;
        let mut inner = writer.into_inner();
        inner
            .write_all(b"\n")
            .and_then(|()| inner.flush())
            .map_err(|e| ConvertError::io(&self.path, e))?;
        drop(inner);
        self.state = BuilderState::Closed;

        let mut report = std::mem::take(&mut self.report);
        report.external_files = self.store.written();
        report.documents.push(self.path.clone());

        let validation = match validate_document(&self.path) {
            Ok(validation) => {
                for diagnostic in validation.diagnostics() {
                    report.record(&diagnostic);
                }
                report.validation_failures += validation.validation_errors.len() as u64;
                report.integrity_failures += validation.integrity_errors.len() as u64;
                Some(validation)
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Could not re-read document");
                report.record(&Diagnostic::error(format!(
                    "Could not validate '{}': {e}",
                    self.path.display()
                )));
                report.validation_failures += 1;
                None
            }
        };

        info!(
            path = %self.path.display(),
            messages = report.valid_messages + report.incomplete_messages,
            local_ids = self.local_id,
            "Document closed"
        );
        Ok(DocumentOutcome {
            path: self.path.clone(),
            report,
            briefs: std::mem::take(&mut self.briefs),
            validation,
        })
    }
}

fn write_hash<W: Write>(w: &mut EaxsWriter<W>, digest: &Digest) -> Result<()> {
    w.start("Hash")?;
    w.element("Value", &digest.to_hex())?;
    w.element("Function", digest.algorithm.name())?;
    w.end("Hash")
}

/// Writes one message tree, handing out LocalIds from the builder's
/// counter.
struct MessageEmitter<'a, W: Write> {
    writer: &'a mut EaxsWriter<W>,
    external_folder: &'a str,
    /// LocalId of the top-level message, which names its external files.
    top_id: u64,
    store: &'a mut ExternalContentStore,
    policy: ContentEncodingPolicy,
    report: &'a mut ConversionReport,
    local_id: &'a mut u64,
    problems: u64,
    first_problem: Option<String>,
}

impl<W: Write> MessageEmitter<'_, W> {
    fn next_id(&mut self) -> Result<u64> {
        *self.local_id += 1;
        let id = *self.local_id;
        self.writer.element("LocalId", &id.to_string())?;
        Ok(id)
    }

    fn external_rel_path(&self) -> String {
        self.external_folder.replace('\\', "/")
    }

    fn note(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        self.writer.comment(diagnostic)?;
        self.report.record(diagnostic);
        if diagnostic.severity >= Severity::Warning {
            self.problems += 1;
            self.first_problem
                .get_or_insert_with(|| diagnostic.message.clone());
        }
        Ok(())
    }

    fn notes(&mut self, diagnostics: &[Diagnostic]) -> Result<()> {
        diagnostics.iter().try_for_each(|d| self.note(d))
    }

    /// Header-derived text, with a warning when characters had to be
    /// replaced.
    fn header_text(&mut self, local: &str, header: &str, value: &str) -> Result<()> {
        if !is_valid_xml_text(value) {
            self.note(&Diagnostic::warning(format!(
                "The '{header}' header contains characters that are not valid in XML; they were replaced with U+FFFD"
            )))?;
        }
        self.writer.element(local, value)
    }

    fn message(&mut self, message: &Message, top_level: bool) -> Result<u64> {
        let tag = if top_level { "Message" } else { "ChildMessage" };
        self.writer.start(tag)?;
        if top_level {
            let rel_path = self.external_rel_path();
            self.writer.element("RelPath", &rel_path)?;
        }
        let id = self.next_id()?;
        if top_level {
            self.top_id = id;
        }
        self.notes(&message.diagnostics)?;

        if let Some(id) = &message.message_id {
            self.header_text("MessageId", "Message-ID", id)?;
        }
        self.writer.optional("MimeVersion", message.mime_version.as_deref())?;
        if let Some(date) = message.orig_date {
            self.writer
                .element("OrigDate", &date.to_rfc3339_opts(SecondsFormat::Secs, true))?;
        }
        self.addresses("From", &message.from)?;
        if let Some(sender) = &message.sender {
            self.writer.empty(
                "Sender",
                &[("name", &sender.display_name), ("address", &sender.address)],
            )?;
        }
        self.addresses("To", &message.to)?;
        self.addresses("Cc", &message.cc)?;
        self.addresses("Bcc", &message.bcc)?;
        for id in &message.in_reply_to {
            self.header_text("InReplyTo", "In-Reply-To", id)?;
        }
        for id in &message.references {
            self.header_text("References", "References", id)?;
        }
        if let Some(subject) = &message.subject {
            self.header_text("Subject", "Subject", subject)?;
        }
        for comment in &message.comments {
            self.header_text("Comments", "Comments", comment)?;
        }
        for keyword in &message.keywords {
            self.header_text("Keywords", "Keywords", keyword)?;
        }

        for header in &message.headers {
            let lower = header.name.to_ascii_lowercase();
            if MAPPED_HEADERS.contains(&lower.as_str()) || lower.starts_with("content-") {
                continue;
            }
            self.writer.start("Header")?;
            self.writer.element("Name", &header.name)?;
            self.header_text("Value", &header.name, &header.value)?;
            self.writer.end("Header")?;
        }
        for flag in &message.status_flags {
            self.writer.element("StatusFlag", flag.as_str())?;
        }

        self.body(&message.body)?;

        for incomplete in &message.incomplete {
            self.writer.start("Incomplete")?;
            self.writer.element("ErrorType", &incomplete.error_type)?;
            self.writer
                .optional("ErrorLocation", incomplete.location.as_deref())?;
            self.writer.end("Incomplete")?;
        }
        if let Some(properties) = message.properties.as_ref().filter(|_| top_level) {
            self.writer.start("MessageProperties")?;
            self.writer
                .optional("Eol", properties.eol.map(|e| e.as_str()))?;
            write_hash(&mut *self.writer, &properties.hash)?;
            self.writer.element("Size", &properties.size.to_string())?;
            self.writer.end("MessageProperties")?;
        }
        self.writer.end(tag)?;
        Ok(id)
    }

    fn addresses(&mut self, local: &str, entries: &[AddressEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.writer.start(local)?;
        for entry in entries {
            match entry {
                AddressEntry::Mailbox(m) => self.writer.empty(
                    "Mailbox",
                    &[("name", &m.display_name), ("address", &m.address)],
                )?,
                AddressEntry::Group { name, members } => {
                    self.writer.start("Group")?;
                    self.writer.element("Name", name)?;
                    for m in members {
                        self.writer.empty(
                            "Mailbox",
                            &[("name", &m.display_name), ("address", &m.address)],
                        )?;
                    }
                    self.writer.end("Group")?;
                }
            }
        }
        self.writer.end(local)
    }

    fn body(&mut self, body: &Body) -> Result<()> {
        match body {
            Body::Multi(multi) => self.multi_body(multi),
            Body::Single(single) => self.single_body(single),
        }
    }

    fn multi_body(&mut self, multi: &MultiBody) -> Result<()> {
        let attachment = bool_str(multi.fields.is_attachment());
        self.writer
            .start_with("MultiBody", &[("IsAttachment", attachment)])?;
        self.notes(&multi.diagnostics)?;
        self.mime_fields(&multi.fields, true)?;
        self.writer.optional("Preamble", multi.preamble.as_deref())?;
        if multi.parts.is_empty() {
            self.writer.empty("MissingBody", &[])?;
        }
        for part in &multi.parts {
            self.body(part)?;
        }
        self.writer.optional("Epilogue", multi.epilogue.as_deref())?;
        self.writer.end("MultiBody")
    }

    fn single_body(&mut self, single: &SingleBody) -> Result<()> {
        let attachment = bool_str(single.fields.is_attachment());
        self.writer
            .start_with("SingleBody", &[("IsAttachment", attachment)])?;
        self.notes(&single.diagnostics)?;
        self.mime_fields(&single.fields, false)?;

        match &single.content {
            LeafContent::Data(data) => match self.policy.placement(&single.fields) {
                Placement::Inline => self.inline(&single.fields, data)?,
                Placement::External => self.external(&single.fields, data)?,
            },
            LeafContent::Phantom(text) => self.writer.element("PhantomBody", text)?,
            LeafContent::ChildMessage(child) => {
                self.message(child, false)?;
            }
        }
        self.writer.end("SingleBody")
    }

    fn inline(&mut self, fields: &MimeFields, data: &[u8]) -> Result<()> {
        let encoded = self.policy.encode(fields, data);
        self.notes(&encoded.diagnostics)?;
        self.writer.start("BodyContent")?;
        self.writer.cdata_element("Content", &encoded.content)?;
        self.writer.optional(
            "TransferEncoding",
            encoded.transfer_encoding.map(|t| t.as_str()),
        )?;
        self.writer.end("BodyContent")
    }

    /// The part's `LocalId` is only consumed once its file is written.
    fn external(&mut self, fields: &MimeFields, data: &[u8]) -> Result<()> {
        let part_id = *self.local_id + 1;
        let stored = match self.store.store(self.top_id, part_id, fields, data) {
            Ok(stored) => stored,
            Err(e) => {
                self.note(&Diagnostic::error(format!(
                    "Could not write external content for part {part_id}: {e}. The content is embedded instead"
                )))?;
                return self.inline(fields, data);
            }
        };
        self.notes(&stored.diagnostics)?;
        let reference = stored.reference;
        self.writer.start("ExtBodyContent")?;
        self.writer.element("RelPath", &reference.rel_path)?;
        self.next_id()?;
        self.writer.element("XMLWrapped", bool_str(reference.wrapped))?;
        write_hash(&mut *self.writer, &reference.hash)?;
        self.writer.element("Size", &reference.size.to_string())?;
        self.writer.end("ExtBodyContent")
    }

    fn mime_fields(&mut self, fields: &MimeFields, multipart: bool) -> Result<()> {
        let w = &mut *self.writer;
        w.optional("ContentType", fields.content_type.as_deref().or(fields.default_type))?;
        w.optional("Charset", fields.charset.as_deref())?;
        w.optional("ContentName", fields.content_name.as_deref())?;
        if multipart {
            w.optional("BoundaryString", fields.boundary.as_deref())?;
        }
        for param in &fields.content_type_params {
            w.start("ContentTypeParam")?;
            w.element("Name", &param.name)?;
            w.element("Value", &param.value)?;
            w.end("ContentTypeParam")?;
        }
        w.optional("TransferEncoding", fields.transfer_encoding.as_deref())?;
        w.optional("ContentId", fields.content_id.as_deref())?;
        w.optional("Description", fields.description.as_deref())?;
        w.optional("Disposition", fields.disposition.as_deref())?;
        w.optional("DispositionFileName", fields.disposition_file_name.as_deref())?;
        for param in &fields.disposition_params {
            w.start("DispositionParam")?;
            w.element("Name", &param.name)?;
            w.element("Value", &param.value)?;
            w.end("DispositionParam")?;
        }
        for language in &fields.content_languages {
            w.element("ContentLanguage", language)?;
        }
        for header in &fields.other_headers {
            w.start("OtherMimeHeader")?;
            w.element("Name", &header.name)?;
            w.element("Value", &header.value)?;
            w.end("OtherMimeHeader")?;
        }
        Ok(())
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{hash_bytes, HashAlgorithm};
    use crate::model::body::Param;
    use crate::parser::mime::parse_message;

    fn settings(external: bool, wrap: bool) -> ConversionSettings {
        ConversionSettings {
            save_attachments_and_binary_content_externally: external,
            wrap_external_content_in_xml: wrap,
            ..Default::default()
        }
    }

    fn sample() -> Message {
        let mut message = parse_message(
            b"From: A <a@example.com>\nTo: b@example.com\nSubject: hi\nX-Custom: yes\n\
Content-Type: multipart/mixed; boundary=zz\n\n--zz\nContent-Type: text/plain\n\nhello\n\
--zz\nContent-Type: application/pdf\nContent-Disposition: attachment; filename=a.pdf\n\
Content-Transfer-Encoding: base64\n\nJVBERg==\n--zz--\n",
            0,
        )
        .unwrap();
        message.properties = Some(crate::model::message::MessageProperties {
            eol: Some(crate::model::message::Eol::Lf),
            hash: hash_bytes(HashAlgorithm::Sha256, b"x"),
            size: 1,
        });
        message
    }

    fn build(dir: &Path, settings: &ConversionSettings, messages: usize) -> DocumentOutcome {
        let path = dir.join("inbox.xml");
        let mut b = EaxsDocumentBuilder::create(
            &path,
            Account::new("mailto:a@example.com", "a@example.com"),
            settings,
        )
        .unwrap();
        b.start_account().unwrap();
        b.open_folder("inbox", "inbox").unwrap();
        for _ in 0..messages {
            b.write_message(&sample()).unwrap();
        }
        b.close_folder().unwrap();
        b.finish().unwrap()
    }

    #[test]
    fn test_local_ids_are_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = build(dir.path(), &settings(false, false), 2);
        let validation = outcome.validation.unwrap();
        assert!(validation.is_valid(), "{validation:?}");
        // messages only, everything is inline
        assert_eq!(validation.local_ids, 2);
        assert_eq!(outcome.report.valid_messages, 2);
        assert_eq!(outcome.briefs[1].local_id, 2);
        assert_eq!(outcome.report.errors, 0);
    }

    #[test]
    fn test_external_content_is_referenced() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = build(dir.path(), &settings(true, true), 1);
        assert_eq!(outcome.report.external_files, 1);
        let xml = std::fs::read_to_string(dir.path().join("inbox.xml")).unwrap();
        assert!(xml.contains("<xm:RelPath>ExtBodyContent</xm:RelPath>\n"));
        assert!(xml.contains("<xm:RelPath>inbox/1-2.xml</xm:RelPath>"));
        assert!(xml.contains("<xm:LocalId>2</xm:LocalId>\n"));
        assert!(xml.contains("<xm:XMLWrapped>true</xm:XMLWrapped>"));
        assert!(dir.path().join("ExtBodyContent/inbox/1-2.xml").is_file());
        assert!(outcome.validation.unwrap().is_valid());
    }

    #[test]
    fn test_child_message_parts_use_the_top_level_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.xml");
        let mut b = EaxsDocumentBuilder::create(&path, Account::default(), &settings(true, false))
            .unwrap();
        b.start_account().unwrap();
        b.open_folder("inbox", "inbox").unwrap();
        b.write_message(&sample()).unwrap();
        let forwarded = parse_message(
            b"From: c@example.com\nTo: d@example.com\nSubject: fwd\n\
Content-Type: multipart/mixed; boundary=outer\n\n--outer\nContent-Type: text/plain\n\nsee below\n\
--outer\nContent-Type: message/rfc822\n\nFrom: a@example.com\nTo: b@example.com\nSubject: inner\n\
Content-Type: multipart/mixed; boundary=inner\n\n--inner\nContent-Type: application/pdf\n\
Content-Disposition: attachment; filename=b.pdf\nContent-Transfer-Encoding: base64\n\nJVBERg==\n\
--inner--\n--outer--\n",
            0,
        )
        .unwrap();
        b.write_message(&forwarded).unwrap();
        b.close_folder().unwrap();
        let outcome = b.finish().unwrap();

        // first message: 1 and its pdf 2; second: 3, child 4, nested pdf 5
        assert!(dir.path().join("ExtBodyContent/inbox/1-2.pdf").is_file());
        assert!(dir.path().join("ExtBodyContent/inbox/3-5.pdf").is_file());
        assert_eq!(outcome.briefs[1].local_id, 3);
        let validation = outcome.validation.unwrap();
        assert!(validation.is_valid(), "{validation:?}");
        assert_eq!(validation.local_ids, 5);
    }

    #[test]
    fn test_settings_become_processing_instructions() {
        let dir = tempfile::tempdir().unwrap();
        build(dir.path(), &settings(false, false), 1);
        let xml = std::fs::read_to_string(dir.path().join("inbox.xml")).unwrap();
        assert!(xml.contains("<?HashAlgorithmName SHA256?>"));
        assert!(xml.contains("<?OneFilePerMbox false?>"));
        assert!(xml.contains("<xm:Header>\n"));
        assert!(xml.contains("<xm:Name>X-Custom</xm:Name>"));
        assert!(!xml.contains("<xm:Name>Subject</xm:Name>"));
    }

    #[test]
    fn test_empty_folder_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = build(dir.path(), &settings(false, false), 0);
        assert_eq!(outcome.report.warnings, 1);
        let xml = std::fs::read_to_string(dir.path().join("inbox.xml")).unwrap();
        assert!(xml.contains("<!--WARNING: The folder contains no messages-->"));
    }

    #[test]
    fn test_out_of_order_calls_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.xml");
        let mut b = EaxsDocumentBuilder::create(&path, Account::default(), &settings(false, false))
            .unwrap();
        assert!(matches!(
            b.open_folder("f", "f"),
            Err(ConvertError::InvalidState { .. })
        ));
        b.start_account().unwrap();
        assert!(b.write_message(&sample()).is_err());
        b.open_folder("f", "f").unwrap();
        let mbox = MboxFile {
            rel_path: "f".into(),
            file_ext: None,
            eol: None,
            hash: hash_bytes(HashAlgorithm::Sha256, b""),
            size: 0,
            message_count: 0,
            source: PathBuf::from("f"),
        };
        b.write_mbox(&mbox).unwrap();
        assert!(b.write_message(&sample()).is_err());
        b.finish().unwrap();
        assert_eq!(b.state(), BuilderState::Closed);
        assert!(b.start_account().is_err());
    }

    #[test]
    fn test_invalid_header_characters_warn() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.xml");
        let mut b = EaxsDocumentBuilder::create(&path, Account::default(), &settings(false, false))
            .unwrap();
        b.start_account().unwrap();
        b.open_folder("f", "f").unwrap();
        let mut message = sample();
        message.subject = Some("bell\u{7}".into());
        message.body = Body::Single(SingleBody {
            fields: MimeFields {
                content_type_params: vec![Param::new("format", "flowed")],
                ..Default::default()
            },
            content: LeafContent::Data(b"text".to_vec()),
            diagnostics: Vec::new(),
        });
        b.write_message(&message).unwrap();
        let outcome = b.finish().unwrap();
        assert_eq!(outcome.report.warnings, 1);
        assert_eq!(outcome.briefs[0].errors, 1);
        let xml = std::fs::read_to_string(&path).unwrap();
        assert!(xml.contains("<xm:Subject>bell\u{FFFD}</xm:Subject>"));
    }
}
