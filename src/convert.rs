//! Conversion driver: turns mbox files or folders of them into EAXS
//! documents plus their summary CSVs.
//!
//! Everything runs sequentially. Each document owns its LocalId counter, so
//! documents produced by one call never share numbering.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use crate::config::ConversionSettings;
use crate::digest::{HashAlgorithm, HashingReader};
use crate::eaxs::EaxsDocumentBuilder;
use crate::error::{ConvertError, Result};
use crate::export::csv::write_briefs;
use crate::model::account::{Account, MboxFile};
use crate::parser::mbox::{Dialect, MboxSegmenter, SegmentOutcome};
use crate::parser::mime;
use crate::paths;
use crate::report::{ConversionReport, Diagnostic};

/// Read buffer for mbox files.
const READ_BUFFER: usize = 256 * 1024;

/// Progress callback: (mbox file, bytes consumed, file size).
pub type Progress<'a> = &'a dyn Fn(&Path, u64, u64);

/// Converts with one fixed set of settings.
pub struct Converter<'a> {
    settings: ConversionSettings,
    progress: Option<Progress<'a>>,
}

impl<'a> Converter<'a> {
    pub fn new(settings: ConversionSettings) -> Self {
        Self {
            settings,
            progress: None,
        }
    }

    /// Report bytes consumed while segmenting each mbox.
    pub fn with_progress(mut self, progress: Progress<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    fn check_settings(&self) -> Result<HashAlgorithm> {
        let algorithm = self.settings.hash_algorithm()?;
        paths::validate_external_folder(&self.settings.external_content_folder)?;
        Ok(algorithm)
    }

    /// Convert one mbox file into `<output>/<stem>.xml` and `<stem>.csv`.
    pub fn convert_file(
        &self,
        input: &Path,
        output: &Path,
        owner_uri: &str,
        owner_addresses: &str,
    ) -> Result<ConversionReport> {
        let algorithm = self.check_settings()?;
        paths::validate_file_paths(input, output, &self.settings.external_content_folder)?;
        let input = paths::normalize(input)?;
        let output = paths::normalize(output)?;
        std::fs::create_dir_all(&output).map_err(|e| ConvertError::io(&output, e))?;

        let account = Account::new(owner_uri, owner_addresses);
        let start = Instant::now();
        let report = self.convert_one(&input, &output, &account, algorithm)?;
        info!(
            input = %input.display(),
            valid = report.valid_messages,
            errors = report.errors,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Conversion finished"
        );
        Ok(report)
    }

    /// Convert every mbox directly inside `input`.
    ///
    /// With `OneFilePerMbox` each file gets its own document, otherwise one
    /// `<dirname>.xml` holds a Folder per file.
    pub fn convert_folder(
        &self,
        input: &Path,
        output: &Path,
        owner_uri: &str,
        owner_addresses: &str,
    ) -> Result<ConversionReport> {
        let algorithm = self.check_settings()?;
        paths::validate_folder_paths(input, output)?;
        let input = paths::normalize(input)?;
        let output = paths::normalize(output)?;
        let files = paths::list_mbox_files(&input)?;
        if self.settings.one_file_per_mbox {
            let external = &self.settings.external_content_folder;
            for file in &files {
                paths::check_derived_outputs(file, &output, external)?;
            }
        }
        std::fs::create_dir_all(&output).map_err(|e| ConvertError::io(&output, e))?;

        let account = Account::new(owner_uri, owner_addresses);
        let start = Instant::now();
        let mut report = ConversionReport::default();

        if self.settings.one_file_per_mbox {
            if files.is_empty() {
                report.record(&Diagnostic::warning(format!(
                    "No mbox files found in '{}'",
                    input.display()
                )));
            }
            for file in &files {
                report.merge(self.convert_one(file, &output, &account, algorithm)?);
            }
        } else {
            let name = display_name(&input);
            let doc_path = output.join(format!("{name}.xml"));
            let mut builder =
                EaxsDocumentBuilder::create(&doc_path, account.clone(), &self.settings)?;
            builder.start_account()?;
            if files.is_empty() {
                builder.diagnostic(&Diagnostic::warning(format!(
                    "No mbox files found in '{}'",
                    input.display()
                )))?;
            }
            for file in &files {
                self.write_folder(&mut builder, file, &output, &account, algorithm, true)?;
            }
            report.merge(self.finish_document(&mut builder, &output, &name)?);
        }

        info!(
            input = %input.display(),
            files = files.len(),
            valid = report.valid_messages,
            errors = report.errors,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Folder conversion finished"
        );
        Ok(report)
    }

    /// One document for `mbox` in `output_dir`. With `OneFilePerMbox` and
    /// `IncludeSubFolders`, child mboxes follow as documents of their own
    /// under `<output_dir>/<subdir>/`.
    fn convert_one(
        &self,
        mbox: &Path,
        output_dir: &Path,
        account: &Account,
        algorithm: HashAlgorithm,
    ) -> Result<ConversionReport> {
        let stem = display_name(mbox);
        let doc_path = output_dir.join(format!("{stem}.xml"));
        let mut builder = EaxsDocumentBuilder::create(&doc_path, account.clone(), &self.settings)?;
        builder.start_account()?;
        let nested = !self.settings.one_file_per_mbox;
        let sub_dir =
            self.write_folder(&mut builder, mbox, output_dir, account, algorithm, nested)?;
        let mut report = self.finish_document(&mut builder, output_dir, &stem)?;

        if let Some(sub_dir) = sub_dir.filter(|_| !nested) {
            let child_output = output_dir.join(sub_dir.file_name().unwrap_or(sub_dir.as_os_str()));
            for child in paths::list_mbox_files(&sub_dir)? {
                let external = &self.settings.external_content_folder;
                if let Err(e) = paths::check_derived_outputs(&child, &child_output, external) {
                    report.record(&Diagnostic::error(format!(
                        "Sub-folder mailbox '{}' was skipped: {e}",
                        child.display()
                    )));
                    continue;
                }
                report.merge(self.convert_one(&child, &child_output, account, algorithm)?);
            }
        }
        Ok(report)
    }

    fn finish_document(
        &self,
        builder: &mut EaxsDocumentBuilder,
        output_dir: &Path,
        stem: &str,
    ) -> Result<ConversionReport> {
        let outcome = builder.finish()?;
        write_briefs(&outcome.briefs, &output_dir.join(format!("{stem}.csv")))?;
        if let Some(validation) = outcome.validation.as_ref().filter(|v| !v.is_valid()) {
            warn!(
                path = %outcome.path.display(),
                validation = validation.validation_errors.len(),
                integrity = validation.integrity_errors.len(),
                "Document did not validate"
            );
        }
        Ok(outcome.report)
    }

    /// Write the Folder for `mbox`: its messages, the Mbox element and, in
    /// nested mode, child Folders for its sub-folder mailboxes.
    ///
    /// Returns the sub-folder directory when sub-folders are enabled but
    /// have to be converted separately.
    fn write_folder(
        &self,
        builder: &mut EaxsDocumentBuilder,
        mbox: &Path,
        doc_dir: &Path,
        account: &Account,
        algorithm: HashAlgorithm,
        nested: bool,
    ) -> Result<Option<PathBuf>> {
        let rel_path = paths::relative_path(&paths::resolved(mbox), &paths::resolved(doc_dir));
        builder.open_folder(&display_name(mbox), &rel_path)?;
        info!(path = %mbox.display(), "Converting mbox");

        let file = match File::open(mbox) {
            Ok(file) => file,
            Err(e) => {
                builder.diagnostic(&Diagnostic::error(format!(
                    "The mbox file '{}' could not be read: {e}",
                    mbox.display()
                )))?;
                builder.close_folder()?;
                return Ok(None);
            }
        };
        let total = file.metadata().map(|m| m.len()).unwrap_or(0);
        let reader = BufReader::with_capacity(READ_BUFFER, HashingReader::new(file, algorithm));
        let mut segmenter = MboxSegmenter::new(reader, self.settings.maximum_message_size);

        let mut written = 0u64;
        for record in segmenter.by_ref() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    builder.diagnostic(&Diagnostic::error(format!(
                        "Reading '{}' stopped: {e}",
                        mbox.display()
                    )))?;
                    break;
                }
            };
            match mime::decompose(&record, algorithm, account) {
                Ok(message) => {
                    builder.write_message(&message)?;
                    written += 1;
                }
                Err(e) => builder.diagnostic(&Diagnostic::error(format!(
                    "Message {} at byte offset {} was skipped: {e}",
                    record.index + 1,
                    record.start
                )))?,
            }
            if let Some(progress) = self.progress {
                progress(mbox, record.end, total);
            }
        }

        let summary = segmenter.summary();
        for diagnostic in &summary.diagnostics {
            builder.diagnostic(diagnostic)?;
        }
        match (summary.outcome, summary.dialect) {
            (SegmentOutcome::Empty, _) => builder.diagnostic(&Diagnostic::warning(format!(
                "The mbox file '{}' is empty",
                mbox.display()
            )))?,
            (SegmentOutcome::NoDelimiter, Dialect::Mbx) => {
                builder.diagnostic(&Diagnostic::warning(format!(
                    "The mbx file '{}' contains no messages",
                    mbox.display()
                )))?
            }
            (SegmentOutcome::NoDelimiter, Dialect::FromDelimited) => {
                builder.diagnostic(&Diagnostic::error(format!(
                    "'{}' is not an mbox file: no 'From ' delimiter line was found",
                    mbox.display()
                )))?
            }
            _ => {}
        }

        let (hash, size) = segmenter
            .into_inner()
            .into_inner()
            .finish()
            .map_err(|e| ConvertError::io(mbox, e))?;
        if let Some(progress) = self.progress {
            progress(mbox, size, total);
        }
        builder.write_mbox(&MboxFile {
            rel_path,
            file_ext: mbox
                .extension()
                .map(|e| e.to_string_lossy().into_owned()),
            eol: summary.eol_counts.dominant(),
            hash,
            size,
            message_count: summary.records,
            source: mbox.to_path_buf(),
        })?;
        info!(path = %mbox.display(), messages = written, size, "Mbox done");

        let mut separate = None;
        if self.settings.include_sub_folders {
            match paths::sub_folder_dir(mbox) {
                Ok(Some(dir)) if nested => {
                    for child in paths::list_mbox_files(&dir)? {
                        self.write_folder(builder, &child, doc_dir, account, algorithm, true)?;
                    }
                }
                Ok(found) => separate = found,
                Err(e) => builder.diagnostic(&Diagnostic::error(format!(
                    "Sub-folders of '{}' were skipped: {e}",
                    mbox.display()
                )))?,
            }
        }
        builder.close_folder()?;
        Ok(separate)
    }
}

/// File or directory name without its extension.
fn display_name(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mbox".to_string())
}

/// Convert one mbox file. See [`Converter::convert_file`].
pub fn convert_file(
    input: &Path,
    output: &Path,
    owner_uri: &str,
    owner_addresses: &str,
    settings: &ConversionSettings,
) -> Result<ConversionReport> {
    Converter::new(settings.clone()).convert_file(input, output, owner_uri, owner_addresses)
}

/// Convert a folder of mbox files. See [`Converter::convert_folder`].
pub fn convert_folder(
    input: &Path,
    output: &Path,
    owner_uri: &str,
    owner_addresses: &str,
    settings: &ConversionSettings,
) -> Result<ConversionReport> {
    Converter::new(settings.clone()).convert_folder(input, output, owner_uri, owner_addresses)
}
